//! Pending-call bookkeeping and the static callback routing tables

use super::outcome::{AckResponse, Packet};
use crate::error::{EngineError, EngineResult};
use crate::icq::QueryResponse;
use crate::keeper::Keeper;
use crate::state::Ledger;
use crate::types::BlockContext;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one in-flight packet. Sequences are monotonic per channel, so
/// no two pending calls share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PacketKey {
    pub port_id: String,
    pub channel_id: String,
    pub sequence: u64,
}

impl PacketKey {
    pub fn new(port_id: impl Into<String>, channel_id: impl Into<String>, sequence: u64) -> Self {
        Self {
            port_id: port_id.into(),
            channel_id: channel_id.into(),
            sequence,
        }
    }
}

impl fmt::Display for PacketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.port_id, self.channel_id, self.sequence)
    }
}

/// A submitted call waiting for its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackData {
    pub port_id: String,
    pub channel_id: String,
    pub sequence: u64,
    pub callback_id: String,
    /// Encoded `CallbackArgs`, left opaque here
    pub callback_args: Vec<u8>,
}

impl CallbackData {
    pub fn key(&self) -> PacketKey {
        PacketKey::new(self.port_id.clone(), self.channel_id.clone(), self.sequence)
    }
}

pub fn set_callback_data(ledger: &mut Ledger, data: CallbackData) {
    ledger.set_callback_data(data);
}

pub fn get_callback_data<'a>(ledger: &'a Ledger, key: &PacketKey) -> Option<&'a CallbackData> {
    ledger.get_callback_data(key)
}

pub fn delete_callback_data(ledger: &mut Ledger, key: &PacketKey) -> Option<CallbackData> {
    ledger.delete_callback_data(key)
}

/// Handler for the outcome of an interchain account tx
pub type IcaCallbackFn = fn(&mut Keeper, &BlockContext, &Packet, &AckResponse, &[u8]) -> EngineResult<()>;

/// Handler for an interchain query response. The second argument is the raw
/// proven value (empty on timeout).
pub type IcqCallbackFn = fn(&mut Keeper, &BlockContext, &[u8], &QueryResponse) -> EngineResult<()>;

/// Callback id to handler routing, fixed at startup
pub struct CallbackTable<F> {
    handlers: BTreeMap<&'static str, F>,
}

impl<F: Copy> CallbackTable<F> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, callback_id: &'static str, handler: F) -> EngineResult<()> {
        if self.handlers.contains_key(callback_id) {
            return Err(EngineError::DuplicateCallbackId(callback_id.to_string()));
        }
        self.handlers.insert(callback_id, handler);
        Ok(())
    }

    pub fn get(&self, callback_id: &str) -> Option<F> {
        self.handlers.get(callback_id).copied()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}

impl<F: Copy> Default for CallbackTable<F> {
    fn default() -> Self {
        Self::new()
    }
}
