//! Ledger entity types
//!
//! Host zones, deposit and unbonding records, the fixed-point decimal used
//! for rates and the host-chain messages submitted through interchain
//! accounts.

pub mod decimal;
pub mod host_zone;
pub mod msgs;
pub mod records;

pub use decimal::Dec;
pub use host_zone::{ExchangeRate, HostZone, IcaAccount, IcaAccountType, Validator};
pub use msgs::{Coin, HostMsg};
pub use records::{
    user_redemption_record_key, DepositRecord, DepositRecordStatus, EpochUnbondingRecord,
    HostZoneUnbonding, HostZoneUnbondingStatus, UserRedemptionRecord,
};

use chrono::{DateTime, Utc};

/// Name under which this engine registers queries and callbacks
pub const MODULE_NAME: &str = "stakeibc";

/// The block being processed. Every ledger mutation happens inside exactly
/// one block context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    /// Block time in unix nanoseconds
    pub time: u64,
}

impl BlockContext {
    pub fn new(height: u64, time: u64) -> Self {
        Self { height, time }
    }

    pub fn from_datetime(height: u64, time: DateTime<Utc>) -> Self {
        let nanos = time.timestamp_nanos_opt().unwrap_or_default().max(0) as u64;
        Self::new(height, nanos)
    }
}
