//! In-memory ledger of every entity the engine reads or writes

use crate::callbacks::{CallbackData, PacketKey};
use crate::epochs::EpochTracker;
use crate::error::{EngineError, EngineResult};
use crate::ratelimit::{RateLimit, RateLimitPath};
use crate::types::{DepositRecord, EpochUnbondingRecord, HostZone, HostZoneUnbonding, UserRedemptionRecord};

use std::collections::BTreeMap;
use tracing::debug;

/// Keyed stores for host zones, records, trackers, pending callbacks and
/// rate limits.
///
/// Writes go through explicit setters and are visible to every later read in
/// the same block. Ordered maps keep iteration deterministic.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ledger {
    host_zones: BTreeMap<String, HostZone>,
    deposit_records: BTreeMap<u64, DepositRecord>,
    next_deposit_id: u64,
    epoch_unbonding_records: BTreeMap<u64, EpochUnbondingRecord>,
    user_redemption_records: BTreeMap<String, UserRedemptionRecord>,
    epoch_trackers: BTreeMap<String, EpochTracker>,
    callback_data: BTreeMap<PacketKey, CallbackData>,
    rate_limits: BTreeMap<RateLimitPath, RateLimit>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // Host zones

    pub fn get_host_zone(&self, chain_id: &str) -> Option<&HostZone> {
        self.host_zones.get(chain_id)
    }

    /// The host zone, or `HostZoneNotFound`
    pub fn require_host_zone(&self, chain_id: &str) -> EngineResult<&HostZone> {
        self.host_zones
            .get(chain_id)
            .ok_or_else(|| EngineError::HostZoneNotFound(chain_id.to_string()))
    }

    pub fn set_host_zone(&mut self, host_zone: HostZone) {
        self.host_zones.insert(host_zone.chain_id.clone(), host_zone);
    }

    pub fn all_host_zones(&self) -> Vec<HostZone> {
        self.host_zones.values().cloned().collect()
    }

    // Deposit records

    pub fn get_deposit_record(&self, id: u64) -> Option<&DepositRecord> {
        self.deposit_records.get(&id)
    }

    pub fn set_deposit_record(&mut self, record: DepositRecord) {
        self.next_deposit_id = self.next_deposit_id.max(record.id + 1);
        self.deposit_records.insert(record.id, record);
    }

    /// Store a new record under the next free id and return that id
    pub fn append_deposit_record(&mut self, mut record: DepositRecord) -> u64 {
        let id = self.next_deposit_id;
        record.id = id;
        self.deposit_records.insert(id, record);
        self.next_deposit_id += 1;
        debug!("Appended deposit record {}", id);
        id
    }

    pub fn remove_deposit_record(&mut self, id: u64) -> Option<DepositRecord> {
        self.deposit_records.remove(&id)
    }

    pub fn all_deposit_records(&self) -> Vec<DepositRecord> {
        self.deposit_records.values().cloned().collect()
    }

    // Epoch unbonding records

    pub fn get_epoch_unbonding_record(&self, epoch_number: u64) -> Option<&EpochUnbondingRecord> {
        self.epoch_unbonding_records.get(&epoch_number)
    }

    pub fn set_epoch_unbonding_record(&mut self, record: EpochUnbondingRecord) {
        self.epoch_unbonding_records.insert(record.epoch_number, record);
    }

    pub fn all_epoch_unbonding_records(&self) -> Vec<EpochUnbondingRecord> {
        self.epoch_unbonding_records.values().cloned().collect()
    }

    pub fn get_host_zone_unbonding(&self, epoch_number: u64, chain_id: &str) -> EngineResult<&HostZoneUnbonding> {
        self.epoch_unbonding_records
            .get(&epoch_number)
            .and_then(|record| record.host_zone_unbonding(chain_id))
            .ok_or_else(|| EngineError::HostZoneUnbondingNotFound {
                epoch_number,
                chain_id: chain_id.to_string(),
            })
    }

    /// Replace one host zone's unbonding within an existing epoch record
    pub fn set_host_zone_unbonding(&mut self, epoch_number: u64, unbonding: HostZoneUnbonding) -> EngineResult<()> {
        let record = self
            .epoch_unbonding_records
            .get_mut(&epoch_number)
            .ok_or(EngineError::EpochUnbondingRecordNotFound(epoch_number))?;

        match record.host_zone_unbonding_mut(&unbonding.host_zone_id) {
            Some(existing) => *existing = unbonding,
            None => record.host_zone_unbondings.push(unbonding),
        }
        Ok(())
    }

    // User redemption records

    pub fn get_user_redemption_record(&self, id: &str) -> Option<&UserRedemptionRecord> {
        self.user_redemption_records.get(id)
    }

    pub fn set_user_redemption_record(&mut self, record: UserRedemptionRecord) {
        self.user_redemption_records.insert(record.id.clone(), record);
    }

    // Epoch trackers

    pub fn get_epoch_tracker(&self, identifier: &str) -> Option<&EpochTracker> {
        self.epoch_trackers.get(identifier)
    }

    pub fn set_epoch_tracker(&mut self, tracker: EpochTracker) {
        self.epoch_trackers.insert(tracker.epoch_identifier.clone(), tracker);
    }

    pub fn all_epoch_trackers(&self) -> Vec<EpochTracker> {
        self.epoch_trackers.values().cloned().collect()
    }

    // Callback data

    pub fn set_callback_data(&mut self, data: CallbackData) {
        self.callback_data.insert(data.key(), data);
    }

    pub fn get_callback_data(&self, key: &PacketKey) -> Option<&CallbackData> {
        self.callback_data.get(key)
    }

    pub fn delete_callback_data(&mut self, key: &PacketKey) -> Option<CallbackData> {
        self.callback_data.remove(key)
    }

    pub fn all_callback_data(&self) -> Vec<CallbackData> {
        self.callback_data.values().cloned().collect()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.callback_data.len()
    }

    // Rate limits

    pub fn get_rate_limit(&self, path: &RateLimitPath) -> Option<&RateLimit> {
        self.rate_limits.get(path)
    }

    pub fn set_rate_limit(&mut self, rate_limit: RateLimit) {
        self.rate_limits.insert(rate_limit.path.clone(), rate_limit);
    }

    pub fn remove_rate_limit(&mut self, path: &RateLimitPath) -> Option<RateLimit> {
        self.rate_limits.remove(path)
    }

    pub fn all_rate_limits(&self) -> Vec<RateLimit> {
        self.rate_limits.values().cloned().collect()
    }
}
