//! Deposit and redemption records kept on the hub

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositRecordStatus {
    /// Funds are being collected on the hub
    Collecting,
    TransferInProgress,
    DelegationQueue,
    DelegationInProgress,
}

impl fmt::Display for DepositRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DepositRecordStatus::Collecting => "COLLECTING",
            DepositRecordStatus::TransferInProgress => "TRANSFER_IN_PROGRESS",
            DepositRecordStatus::DelegationQueue => "DELEGATION_QUEUE",
            DepositRecordStatus::DelegationInProgress => "DELEGATION_IN_PROGRESS",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub id: u64,
    pub host_zone_id: String,
    pub amount: u128,
    pub denom: String,
    pub deposit_epoch_number: u64,
    pub status: DepositRecordStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostZoneUnbondingStatus {
    UnbondingQueue,
    UnbondingInProgress,
    ExitTransferQueue,
    Claimable,
}

impl fmt::Display for HostZoneUnbondingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostZoneUnbondingStatus::UnbondingQueue => "UNBONDING_QUEUE",
            HostZoneUnbondingStatus::UnbondingInProgress => "UNBONDING_IN_PROGRESS",
            HostZoneUnbondingStatus::ExitTransferQueue => "EXIT_TRANSFER_QUEUE",
            HostZoneUnbondingStatus::Claimable => "CLAIMABLE",
        };
        f.write_str(s)
    }
}

/// One host zone's share of an epoch's unbonding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostZoneUnbonding {
    pub host_zone_id: String,
    pub status: HostZoneUnbondingStatus,
    pub native_token_amount: u128,
    pub st_token_amount: u128,
    /// Unix nanos after which the unbonded tokens can be swept
    pub unbonding_time: u64,
    pub user_redemption_records: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochUnbondingRecord {
    pub epoch_number: u64,
    pub host_zone_unbondings: Vec<HostZoneUnbonding>,
}

impl EpochUnbondingRecord {
    pub fn host_zone_unbonding(&self, host_zone_id: &str) -> Option<&HostZoneUnbonding> {
        self.host_zone_unbondings
            .iter()
            .find(|hzu| hzu.host_zone_id == host_zone_id)
    }

    pub fn host_zone_unbonding_mut(&mut self, host_zone_id: &str) -> Option<&mut HostZoneUnbonding> {
        self.host_zone_unbondings
            .iter_mut()
            .find(|hzu| hzu.host_zone_id == host_zone_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRedemptionRecord {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub amount: u128,
    pub denom: String,
    pub host_zone_id: String,
    pub epoch_number: u64,
    pub claim_is_pending: bool,
}

/// Key of a user redemption record: `{host_zone}.{epoch}.{sender}`
pub fn user_redemption_record_key(host_zone_id: &str, epoch_number: u64, sender: &str) -> String {
    format!("{}.{}.{}", host_zone_id, epoch_number, sender)
}
