//! Typed callback arguments
//!
//! Args are stored as JSON, tagged with the callback kind so that decoding
//! into the wrong handler is a typed error rather than a silent misread.

use crate::error::{EngineError, EngineResult};
use crate::types::Coin;

use serde::{Deserialize, Serialize};

pub const DELEGATE: &str = "delegate";
pub const REBALANCE: &str = "rebalance";
pub const REDEMPTION: &str = "redemption";
pub const TRANSFER: &str = "transfer";
pub const REINVEST: &str = "reinvest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDelegation {
    pub validator: String,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateCallback {
    pub host_zone_id: String,
    pub deposit_record_id: u64,
    pub split_delegations: Vec<SplitDelegation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebalancing {
    pub src_validator: String,
    pub dst_validator: String,
    pub amt: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceCallback {
    pub host_zone_id: String,
    pub rebalancings: Vec<Rebalancing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionCallback {
    pub host_zone_id: String,
    pub epoch_unbonding_record_ids: Vec<u64>,
}

/// A send already counted against a rate limit window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitedSend {
    pub denom: String,
    pub channel_id: String,
    pub amount: u128,
    pub window_start: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCallback {
    pub deposit_record_id: u64,
    #[serde(default)]
    pub rate_limited: Option<RateLimitedSend>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinvestCallback {
    pub host_zone_id: String,
    pub reinvest_amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum CallbackArgs {
    Delegate(DelegateCallback),
    Rebalance(RebalanceCallback),
    Redemption(RedemptionCallback),
    Transfer(TransferCallback),
    Reinvest(ReinvestCallback),
}

impl CallbackArgs {
    pub fn callback_id(&self) -> &'static str {
        match self {
            CallbackArgs::Delegate(_) => DELEGATE,
            CallbackArgs::Rebalance(_) => REBALANCE,
            CallbackArgs::Redemption(_) => REDEMPTION,
            CallbackArgs::Transfer(_) => TRANSFER,
            CallbackArgs::Reinvest(_) => REINVEST,
        }
    }

    pub fn encode(&self) -> EngineResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(EngineError::CallbackArgsEncode)
    }

    /// Decode args stored for the `callback` handler
    pub fn decode(callback: &'static str, bytes: &[u8]) -> EngineResult<Self> {
        serde_json::from_slice(bytes).map_err(|source| EngineError::CallbackArgsDecode { callback, source })
    }
}

fn decode_as<T>(
    callback: &'static str,
    bytes: &[u8],
    pick: impl FnOnce(CallbackArgs) -> Result<T, CallbackArgs>,
) -> EngineResult<T> {
    pick(CallbackArgs::decode(callback, bytes)?).map_err(|other| EngineError::CallbackArgsMismatch {
        expected: callback,
        found: other.callback_id(),
    })
}

impl DelegateCallback {
    pub fn decode(bytes: &[u8]) -> EngineResult<Self> {
        decode_as(DELEGATE, bytes, |args| match args {
            CallbackArgs::Delegate(args) => Ok(args),
            other => Err(other),
        })
    }
}

impl RebalanceCallback {
    pub fn decode(bytes: &[u8]) -> EngineResult<Self> {
        decode_as(REBALANCE, bytes, |args| match args {
            CallbackArgs::Rebalance(args) => Ok(args),
            other => Err(other),
        })
    }
}

impl RedemptionCallback {
    pub fn decode(bytes: &[u8]) -> EngineResult<Self> {
        decode_as(REDEMPTION, bytes, |args| match args {
            CallbackArgs::Redemption(args) => Ok(args),
            other => Err(other),
        })
    }
}

impl TransferCallback {
    pub fn decode(bytes: &[u8]) -> EngineResult<Self> {
        decode_as(TRANSFER, bytes, |args| match args {
            CallbackArgs::Transfer(args) => Ok(args),
            other => Err(other),
        })
    }
}

impl ReinvestCallback {
    pub fn decode(bytes: &[u8]) -> EngineResult<Self> {
        decode_as(REINVEST, bytes, |args| match args {
            CallbackArgs::Reinvest(args) => Ok(args),
            other => Err(other),
        })
    }
}
