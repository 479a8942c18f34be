//! Epoch scheduling
//!
//! Tracks the hub's named epochs and derives the deadlines attached to
//! remote calls:
//! - ICA timeouts land just before the next epoch boundary
//! - Queries are only allowed in the buffer window at the end of an epoch
//! - Trackers tick at the start of each block

pub mod scheduler;
pub mod tracker;

pub use scheduler::{
    advance_epochs, get_epoch_tracker, get_start_time_next_epoch, ica_timeout_nanos,
    is_within_buffer_window,
};
pub use tracker::EpochTracker;

/// The protocol's main epoch, driving deposits and delegations
pub const STRIDE_EPOCH: &str = "stride_epoch";
/// Day epoch, driving unbonding sweeps
pub const DAY_EPOCH: &str = "day";
