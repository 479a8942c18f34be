//! Host zones, their validators and interchain accounts

use super::decimal::Dec;
use crate::error::{EngineError, EngineResult};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an interchain account controlled by the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IcaAccountType {
    Delegation,
    Fee,
    Withdrawal,
    Redemption,
}

impl IcaAccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IcaAccountType::Delegation => "DELEGATION",
            IcaAccountType::Fee => "FEE",
            IcaAccountType::Withdrawal => "WITHDRAWAL",
            IcaAccountType::Redemption => "REDEMPTION",
        }
    }
}

impl fmt::Display for IcaAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcaAccount {
    pub address: String,
    pub target: IcaAccountType,
}

impl IcaAccount {
    pub fn new(address: impl Into<String>, target: IcaAccountType) -> Self {
        Self {
            address: address.into(),
            target,
        }
    }
}

/// Exchange rate between a validator's shares and tokens, as of an epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub rate: Dec,
    pub epoch_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub name: String,
    pub address: String,
    pub weight: u64,
    pub delegation_amt: u128,
    pub internal_exchange_rate: Option<ExchangeRate>,
}

impl Validator {
    pub fn new(name: impl Into<String>, address: impl Into<String>, weight: u64, delegation_amt: u128) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            weight,
            delegation_amt,
            internal_exchange_rate: None,
        }
    }
}

/// A remote chain the protocol stakes on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostZone {
    pub chain_id: String,
    pub bech32_prefix: String,
    pub connection_id: String,
    pub transfer_channel_id: String,
    /// Native staking denom on the host
    pub host_denom: String,
    /// Denom of the native token once transferred to the hub
    pub ibc_denom: String,
    /// Hub-side account holding deposits until they are transferred
    pub deposit_address: String,
    pub redemption_rate: Dec,
    pub staked_bal: u128,
    pub validators: Vec<Validator>,
    pub delegation_account: Option<IcaAccount>,
    pub fee_account: Option<IcaAccount>,
    pub withdrawal_account: Option<IcaAccount>,
    pub redemption_account: Option<IcaAccount>,
}

impl HostZone {
    pub fn account(&self, account_type: IcaAccountType) -> Option<&IcaAccount> {
        match account_type {
            IcaAccountType::Delegation => self.delegation_account.as_ref(),
            IcaAccountType::Fee => self.fee_account.as_ref(),
            IcaAccountType::Withdrawal => self.withdrawal_account.as_ref(),
            IcaAccountType::Redemption => self.redemption_account.as_ref(),
        }
    }

    /// The account for a role, provided it has been registered with an address.
    pub fn require_account(&self, account_type: IcaAccountType) -> EngineResult<&IcaAccount> {
        self.account(account_type)
            .filter(|account| !account.address.is_empty())
            .ok_or_else(|| EngineError::IcaAccountNotFound {
                chain_id: self.chain_id.clone(),
                account_type: account_type.to_string(),
            })
    }

    pub fn validator(&self, address: &str) -> Option<&Validator> {
        self.validators.iter().find(|v| v.address == address)
    }

    pub fn validator_mut(&mut self, address: &str) -> Option<&mut Validator> {
        self.validators.iter_mut().find(|v| v.address == address)
    }

    pub fn total_validator_weight(&self) -> u64 {
        self.validators.iter().map(|v| v.weight).sum()
    }

    pub fn total_validator_delegations(&self) -> u128 {
        self.validators.iter().map(|v| v.delegation_amt).sum()
    }
}
