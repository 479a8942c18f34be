//! Channel-layer contract and the payloads this engine builds for it

use crate::error::{EngineError, EngineResult};
use crate::types::{HostMsg, IcaAccountType};

use serde::{Deserialize, Serialize};

/// Port of the token transfer application
pub const TRANSFER_PORT: &str = "transfer";

const EXECUTE_TX: &str = "TYPE_EXECUTE_TX";

/// Owner string of the account for `account_type` on `chain_id`
pub fn ica_owner(chain_id: &str, account_type: IcaAccountType) -> String {
    format!("{}.{}", chain_id, account_type)
}

/// Controller port bound to an account owner
pub fn ica_port_id(owner: &str) -> String {
    format!("icacontroller-{}", owner)
}

#[derive(Debug, Serialize)]
struct CosmosTx<'a> {
    messages: &'a [HostMsg],
}

/// One remote execution request carrying every message of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchainAccountPacketData {
    #[serde(rename = "type")]
    pub packet_type: String,
    pub data: Vec<u8>,
    pub memo: String,
}

impl InterchainAccountPacketData {
    pub fn execute_tx(msgs: &[HostMsg]) -> EngineResult<Self> {
        if msgs.is_empty() {
            return Err(EngineError::InvalidRequest("no messages to submit".to_string()));
        }
        let data = serde_json::to_vec(&CosmosTx { messages: msgs })
            .map_err(|e| EngineError::Internal(format!("failed to serialize host msgs: {}", e)))?;

        Ok(Self {
            packet_type: EXECUTE_TX.to_string(),
            data,
            memo: String::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenPacketData {
    pub denom: String,
    /// Decimal string, as on the wire
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub memo: String,
}

/// Secure-channel transport. Delivery, ordering and timeout proofs are its
/// responsibility; outcomes come back to the engine as inbound events.
#[cfg_attr(test, mockall::automock)]
pub trait IbcTransport: Send + Sync {
    /// Chain id on the other end of a connection
    fn counterparty_chain_id(&self, connection_id: &str) -> EngineResult<String>;

    /// Open (or reopen) the controller channel for an account owner
    fn register_interchain_account(&self, connection_id: &str, owner: &str) -> EngineResult<()>;

    fn get_active_channel_id(&self, connection_id: &str, port_id: &str) -> Option<String>;

    /// Send an execute-tx packet. Returns the sequence assigned to it.
    fn send_tx(
        &self,
        connection_id: &str,
        port_id: &str,
        packet: InterchainAccountPacketData,
        timeout_timestamp: u64,
    ) -> EngineResult<u64>;

    /// Send a token transfer from the hub. Returns the sequence assigned to it.
    fn send_transfer(
        &self,
        source_port: &str,
        source_channel: &str,
        packet: FungibleTokenPacketData,
        timeout_timestamp: u64,
    ) -> EngineResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coin;

    #[test]
    fn test_port_naming() {
        let owner = ica_owner("GAIA", IcaAccountType::Delegation);
        assert_eq!(owner, "GAIA.DELEGATION");
        assert_eq!(ica_port_id(&owner), "icacontroller-GAIA.DELEGATION");
    }

    #[test]
    fn test_execute_tx_batches_messages() {
        let msgs = vec![
            HostMsg::Delegate {
                delegator_address: "cosmos1del".to_string(),
                validator_address: "cosmosvaloper1a".to_string(),
                amount: Coin::new(5, "uatom"),
            },
            HostMsg::Delegate {
                delegator_address: "cosmos1del".to_string(),
                validator_address: "cosmosvaloper1b".to_string(),
                amount: Coin::new(7, "uatom"),
            },
        ];
        let packet = InterchainAccountPacketData::execute_tx(&msgs).unwrap();
        assert_eq!(packet.packet_type, "TYPE_EXECUTE_TX");

        let tx: serde_json::Value = serde_json::from_slice(&packet.data).unwrap();
        assert_eq!(tx["messages"].as_array().map(|m| m.len()), Some(2));

        assert!(InterchainAccountPacketData::execute_tx(&[]).is_err());
    }
}
