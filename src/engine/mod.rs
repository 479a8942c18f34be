//! Engine runtime
//!
//! The engine owns the keeper and turns wall-clock ticks into blocks:
//! 1. Advances epoch trackers and runs epoch hooks
//! 2. Applies acknowledgements, timeouts, query responses and channel
//!    handshakes queued since the previous block
//! 3. Leaves outbound packets in the outbox for the relayer

pub mod events;
pub mod runner;

pub use events::InboundEvent;
pub use runner::{BlockSummary, Engine, EngineStatus, EpochStatus};
