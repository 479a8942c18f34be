//! Engine state
//!
//! Everything the engine knows lives in one `Ledger` passed explicitly to
//! each component:
//! - Host zones and their validators
//! - Deposit, unbonding and redemption records
//! - Epoch trackers
//! - Pending callbacks keyed by packet
//! - Rate limits

mod ledger;

pub use ledger::Ledger;
