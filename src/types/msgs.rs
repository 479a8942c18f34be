//! Messages executed by interchain accounts on a host chain

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A host-chain message, tagged with its type url
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum HostMsg {
    #[serde(rename = "/cosmos.staking.v1beta1.MsgDelegate")]
    Delegate {
        delegator_address: String,
        validator_address: String,
        amount: Coin,
    },

    #[serde(rename = "/cosmos.staking.v1beta1.MsgBeginRedelegate")]
    BeginRedelegate {
        delegator_address: String,
        validator_src_address: String,
        validator_dst_address: String,
        amount: Coin,
    },

    #[serde(rename = "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress")]
    SetWithdrawAddress {
        delegator_address: String,
        withdraw_address: String,
    },

    #[serde(rename = "/cosmos.bank.v1beta1.MsgSend")]
    Send {
        from_address: String,
        to_address: String,
        amount: Vec<Coin>,
    },

    #[serde(rename = "/ibc.applications.transfer.v1.MsgTransfer")]
    Transfer {
        source_port: String,
        source_channel: String,
        token: Coin,
        sender: String,
        receiver: String,
        timeout_timestamp: u64,
    },
}

impl HostMsg {
    pub fn type_url(&self) -> &'static str {
        match self {
            HostMsg::Delegate { .. } => "/cosmos.staking.v1beta1.MsgDelegate",
            HostMsg::BeginRedelegate { .. } => "/cosmos.staking.v1beta1.MsgBeginRedelegate",
            HostMsg::SetWithdrawAddress { .. } => "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress",
            HostMsg::Send { .. } => "/cosmos.bank.v1beta1.MsgSend",
            HostMsg::Transfer { .. } => "/ibc.applications.transfer.v1.MsgTransfer",
        }
    }
}
