//! Module parameters, read-only to the keeper

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Params {
    /// TTL of ICA txs not scoped to an epoch
    pub ica_timeout_nanos: u64,
    pub fee_transfer_timeout_nanos: u64,
    pub ibc_transfer_timeout_nanos: u64,
    /// Fraction of an epoch (`duration / buffer_size`) reserved at its end
    pub buffer_size: u64,
    pub max_num_rebalance: u64,
    /// Percent of rewards kept as commission
    pub stride_commission: u64,
    /// Query withdrawal balances every this many stride epochs
    pub reinvest_interval: u64,
    pub fee_receiver_address: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            ica_timeout_nanos: 600_000_000_000,
            fee_transfer_timeout_nanos: 1_800_000_000_000,
            ibc_transfer_timeout_nanos: 1_800_000_000_000,
            buffer_size: 5,
            max_num_rebalance: 4,
            stride_commission: 10,
            reinvest_interval: 1,
            fee_receiver_address: String::new(),
        }
    }
}
