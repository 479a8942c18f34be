//! Outbound packet queue
//!
//! `Outbox` is the transport and query layer used by the binary. It assigns
//! sequences and queues every outbound packet, registration and query for an
//! external relayer to pick up through the API. Outcomes come back as
//! inbound events. Channel ids are seeded from configuration and updated as
//! handshakes complete or channels close.

use crate::error::{EngineError, EngineResult};
use crate::ica::{FungibleTokenPacketData, IbcTransport, InterchainAccountPacketData};
use crate::icq::{InterchainQuerier, QueryRequest};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// A connection to a host chain and the channels already open on it
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub chain_id: String,
    /// Port id to channel id
    #[serde(default)]
    pub channels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundPacket {
    RegisterAccount {
        connection_id: String,
        owner: String,
    },
    InterchainTx {
        connection_id: String,
        port_id: String,
        channel_id: String,
        sequence: u64,
        timeout_timestamp: u64,
        packet: InterchainAccountPacketData,
    },
    Transfer {
        port_id: String,
        channel_id: String,
        sequence: u64,
        timeout_timestamp: u64,
        packet: FungibleTokenPacketData,
    },
    Query(QueryRequest),
}

pub struct Outbox {
    connections: HashMap<String, ConnectionConfig>,
    /// (connection, port) to open channel
    channels: DashMap<(String, String), String>,
    /// Last sequence used per (port, channel)
    sequences: DashMap<(String, String), u64>,
    pending: Mutex<Vec<OutboundPacket>>,
}

impl Outbox {
    pub fn new(connections: HashMap<String, ConnectionConfig>) -> Self {
        let channels = DashMap::new();
        for (connection_id, connection) in &connections {
            for (port_id, channel_id) in &connection.channels {
                channels.insert((connection_id.clone(), port_id.clone()), channel_id.clone());
            }
        }

        Self {
            connections,
            channels,
            sequences: DashMap::new(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Record a channel whose handshake completed
    pub fn open_channel(&self, connection_id: &str, port_id: &str, channel_id: &str) {
        info!("Channel {} open for {} on {}", channel_id, port_id, connection_id);
        self.channels.insert(
            (connection_id.to_string(), port_id.to_string()),
            channel_id.to_string(),
        );
    }

    pub fn close_channel(&self, connection_id: &str, port_id: &str) {
        if let Some((_, channel_id)) = self
            .channels
            .remove(&(connection_id.to_string(), port_id.to_string()))
        {
            info!("Channel {} for {} on {} closed", channel_id, port_id, connection_id);
        }
    }

    /// Take every queued packet, oldest first
    pub fn drain(&self) -> EngineResult<Vec<OutboundPacket>> {
        let mut pending = self.lock_pending()?;
        Ok(std::mem::take(&mut *pending))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_pending(&self) -> EngineResult<std::sync::MutexGuard<'_, Vec<OutboundPacket>>> {
        self.pending
            .lock()
            .map_err(|_| EngineError::Internal("outbox lock poisoned".to_string()))
    }

    fn push(&self, packet: OutboundPacket) -> EngineResult<()> {
        debug!("Queued outbound packet: {:?}", packet);
        self.lock_pending()?.push(packet);
        Ok(())
    }

    fn next_sequence(&self, port_id: &str, channel_id: &str) -> u64 {
        let mut sequence = self
            .sequences
            .entry((port_id.to_string(), channel_id.to_string()))
            .or_insert(0);
        *sequence += 1;
        *sequence
    }
}

impl IbcTransport for Outbox {
    fn counterparty_chain_id(&self, connection_id: &str) -> EngineResult<String> {
        self.connections
            .get(connection_id)
            .map(|c| c.chain_id.clone())
            .ok_or_else(|| EngineError::ConnectionNotFound(connection_id.to_string()))
    }

    fn register_interchain_account(&self, connection_id: &str, owner: &str) -> EngineResult<()> {
        if !self.connections.contains_key(connection_id) {
            return Err(EngineError::ConnectionNotFound(connection_id.to_string()));
        }
        self.push(OutboundPacket::RegisterAccount {
            connection_id: connection_id.to_string(),
            owner: owner.to_string(),
        })
    }

    fn get_active_channel_id(&self, connection_id: &str, port_id: &str) -> Option<String> {
        self.channels
            .get(&(connection_id.to_string(), port_id.to_string()))
            .map(|c| c.value().clone())
    }

    fn send_tx(
        &self,
        connection_id: &str,
        port_id: &str,
        packet: InterchainAccountPacketData,
        timeout_timestamp: u64,
    ) -> EngineResult<u64> {
        let channel_id = self
            .get_active_channel_id(connection_id, port_id)
            .ok_or_else(|| EngineError::ActiveChannelNotFound {
                connection_id: connection_id.to_string(),
                port_id: port_id.to_string(),
            })?;
        let sequence = self.next_sequence(port_id, &channel_id);

        self.push(OutboundPacket::InterchainTx {
            connection_id: connection_id.to_string(),
            port_id: port_id.to_string(),
            channel_id,
            sequence,
            timeout_timestamp,
            packet,
        })?;
        Ok(sequence)
    }

    fn send_transfer(
        &self,
        source_port: &str,
        source_channel: &str,
        packet: FungibleTokenPacketData,
        timeout_timestamp: u64,
    ) -> EngineResult<u64> {
        let sequence = self.next_sequence(source_port, source_channel);
        self.push(OutboundPacket::Transfer {
            port_id: source_port.to_string(),
            channel_id: source_channel.to_string(),
            sequence,
            timeout_timestamp,
            packet,
        })?;
        Ok(sequence)
    }
}

impl InterchainQuerier for Outbox {
    fn make_request(&self, request: QueryRequest) -> EngineResult<()> {
        if !self.connections.contains_key(&request.connection_id) {
            return Err(EngineError::ConnectionNotFound(request.connection_id));
        }
        self.push(OutboundPacket::Query(request))
    }
}
