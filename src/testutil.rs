//! Shared fixtures for keeper and handler tests

use crate::epochs::{EpochTracker, DAY_EPOCH, STRIDE_EPOCH};
use crate::error::{EngineError, EngineResult};
use crate::ica::{FungibleTokenPacketData, IbcTransport, InterchainAccountPacketData};
use crate::icq::{InterchainQuerier, QueryRequest};
use crate::keeper::{Keeper, Params};
use crate::state::Ledger;
use crate::types::{Dec, HostZone, IcaAccount, IcaAccountType, Validator};

use bech32::{ToBase32, Variant};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const SECOND: u64 = 1_000_000_000;
pub const HOST_ZONE: &str = "GAIA";
pub const CONNECTION_ID: &str = "connection-0";
pub const TRANSFER_CHANNEL_ID: &str = "channel-0";
pub const ICA_CHANNEL_ID: &str = "channel-1";
pub const HOST_DENOM: &str = "uatom";
pub const IBC_DENOM: &str = "ibc/uatom";
pub const FEE_RECEIVER: &str = "stride1feereceiver";

/// Block time inside the stride epoch buffer window of the fixture
pub const IN_WINDOW: u64 = 490 * SECOND;

/// A valid bech32 address with the given human readable part
pub fn address(hrp: &str, seed: u8) -> String {
    bech32::encode(hrp, [seed; 20].to_base32(), Variant::Bech32).unwrap()
}

pub fn valoper(seed: u8) -> String {
    address("cosmosvaloper", seed)
}

pub fn account_address(account_type: IcaAccountType) -> String {
    let seed = match account_type {
        IcaAccountType::Delegation => 101,
        IcaAccountType::Fee => 102,
        IcaAccountType::Withdrawal => 103,
        IcaAccountType::Redemption => 104,
    };
    address("cosmos", seed)
}

/// Five validators, 1600 delegated against a total weight of 1650
pub fn validators() -> Vec<Validator> {
    vec![
        Validator::new("val1", valoper(1), 250, 100),
        Validator::new("val2", valoper(2), 500, 500),
        Validator::new("val3", valoper(3), 100, 200),
        Validator::new("val4", valoper(4), 400, 400),
        Validator::new("val5", valoper(5), 400, 400),
    ]
}

pub fn host_zone() -> HostZone {
    let account = |account_type| Some(IcaAccount::new(account_address(account_type), account_type));
    HostZone {
        chain_id: HOST_ZONE.to_string(),
        bech32_prefix: "cosmos".to_string(),
        connection_id: CONNECTION_ID.to_string(),
        transfer_channel_id: TRANSFER_CHANNEL_ID.to_string(),
        host_denom: HOST_DENOM.to_string(),
        ibc_denom: IBC_DENOM.to_string(),
        deposit_address: "stride1deposit".to_string(),
        redemption_rate: Dec::one(),
        staked_bal: 1_600,
        validators: validators(),
        delegation_account: account(IcaAccountType::Delegation),
        fee_account: account(IcaAccountType::Fee),
        withdrawal_account: account(IcaAccountType::Withdrawal),
        redemption_account: account(IcaAccountType::Redemption),
    }
}

/// GAIA plus a stride epoch (#1, next start 500s, 100s long) and a day epoch
/// (#1, next start 2000s, 400s long)
pub fn ledger() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.set_host_zone(host_zone());
    ledger.set_epoch_tracker(EpochTracker::new(STRIDE_EPOCH, 1, 500 * SECOND, 100 * SECOND));
    ledger.set_epoch_tracker(EpochTracker::new(DAY_EPOCH, 1, 2_000 * SECOND, 400 * SECOND));
    ledger
}

pub fn params() -> Params {
    Params {
        fee_receiver_address: FEE_RECEIVER.to_string(),
        ..Params::default()
    }
}

pub fn keeper_with(transport: Arc<dyn IbcTransport>, querier: Arc<dyn InterchainQuerier>) -> Keeper {
    Keeper::new(ledger(), params(), transport, querier).unwrap()
}

/// Keeper over a fresh fake transport and querier, returning both fakes
pub fn keeper() -> (Keeper, Arc<FakeTransport>, Arc<FakeQuerier>) {
    let transport = Arc::new(FakeTransport::gaia());
    let querier = Arc::new(FakeQuerier::default());
    (keeper_with(transport.clone(), querier.clone()), transport, querier)
}

#[derive(Debug, Clone)]
pub struct SentTx {
    pub connection_id: String,
    pub port_id: String,
    pub packet: InterchainAccountPacketData,
    pub timeout_timestamp: u64,
    pub sequence: u64,
}

impl SentTx {
    pub fn messages(&self) -> Vec<serde_json::Value> {
        let tx: serde_json::Value = serde_json::from_slice(&self.packet.data).unwrap();
        tx["messages"].as_array().cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct SentTransfer {
    pub port_id: String,
    pub channel_id: String,
    pub packet: FungibleTokenPacketData,
    pub timeout_timestamp: u64,
    pub sequence: u64,
}

/// Recording transport: every controller port has an open channel unless
/// closed, and sequences count up per port from 1.
#[derive(Debug, Default)]
pub struct FakeTransport {
    chains: HashMap<String, String>,
    closed_ports: Mutex<HashSet<String>>,
    sequences: Mutex<HashMap<String, u64>>,
    txs: Mutex<Vec<SentTx>>,
    transfers: Mutex<Vec<SentTransfer>>,
    registrations: Mutex<Vec<(String, String)>>,
    fail_sends: AtomicBool,
}

impl FakeTransport {
    pub fn gaia() -> Self {
        let mut chains = HashMap::new();
        chains.insert(CONNECTION_ID.to_string(), HOST_ZONE.to_string());
        Self {
            chains,
            ..Self::default()
        }
    }

    pub fn close_port(&self, port_id: &str) {
        self.closed_ports.lock().unwrap().insert(port_id.to_string());
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn sent_txs(&self) -> Vec<SentTx> {
        self.txs.lock().unwrap().clone()
    }

    pub fn sent_transfers(&self) -> Vec<SentTransfer> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn registrations(&self) -> Vec<(String, String)> {
        self.registrations.lock().unwrap().clone()
    }

    fn next_sequence(&self, port_id: &str) -> EngineResult<u64> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(EngineError::Transport("send rejected".to_string()));
        }
        let mut sequences = self.sequences.lock().unwrap();
        let sequence = sequences.entry(port_id.to_string()).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }
}

impl IbcTransport for FakeTransport {
    fn counterparty_chain_id(&self, connection_id: &str) -> EngineResult<String> {
        self.chains
            .get(connection_id)
            .cloned()
            .ok_or_else(|| EngineError::ConnectionNotFound(connection_id.to_string()))
    }

    fn register_interchain_account(&self, connection_id: &str, owner: &str) -> EngineResult<()> {
        self.registrations
            .lock()
            .unwrap()
            .push((connection_id.to_string(), owner.to_string()));
        Ok(())
    }

    fn get_active_channel_id(&self, connection_id: &str, port_id: &str) -> Option<String> {
        if !self.chains.contains_key(connection_id) || self.closed_ports.lock().unwrap().contains(port_id) {
            return None;
        }
        Some(ICA_CHANNEL_ID.to_string())
    }

    fn send_tx(
        &self,
        connection_id: &str,
        port_id: &str,
        packet: InterchainAccountPacketData,
        timeout_timestamp: u64,
    ) -> EngineResult<u64> {
        let sequence = self.next_sequence(port_id)?;
        self.txs.lock().unwrap().push(SentTx {
            connection_id: connection_id.to_string(),
            port_id: port_id.to_string(),
            packet,
            timeout_timestamp,
            sequence,
        });
        Ok(sequence)
    }

    fn send_transfer(
        &self,
        source_port: &str,
        source_channel: &str,
        packet: FungibleTokenPacketData,
        timeout_timestamp: u64,
    ) -> EngineResult<u64> {
        let sequence = self.next_sequence(source_port)?;
        self.transfers.lock().unwrap().push(SentTransfer {
            port_id: source_port.to_string(),
            channel_id: source_channel.to_string(),
            packet,
            timeout_timestamp,
            sequence,
        });
        Ok(sequence)
    }
}

#[derive(Debug, Default)]
pub struct FakeQuerier {
    requests: Mutex<Vec<QueryRequest>>,
}

impl FakeQuerier {
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl InterchainQuerier for FakeQuerier {
    fn make_request(&self, request: QueryRequest) -> EngineResult<()> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}
