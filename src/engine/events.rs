//! Inbound events delivered by the relayer

use crate::callbacks::Packet;
use crate::icq::QueryResponse;

use serde::{Deserialize, Serialize};

/// An outcome or handshake result reported for something the engine sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Acknowledgement {
        port_id: String,
        channel_id: String,
        sequence: u64,
        /// `{"result": "<hex>"}` or `{"error": "..."}`
        acknowledgement: serde_json::Value,
    },
    Timeout {
        port_id: String,
        channel_id: String,
        sequence: u64,
    },
    QueryResponse(QueryResponse),
    ChannelOpenAck {
        connection_id: String,
        port_id: String,
        channel_id: String,
        /// Address of the interchain account on the host
        address: String,
    },
    ChannelClosed {
        connection_id: String,
        port_id: String,
    },
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Acknowledgement { .. } => "acknowledgement",
            InboundEvent::Timeout { .. } => "timeout",
            InboundEvent::QueryResponse(_) => "query_response",
            InboundEvent::ChannelOpenAck { .. } => "channel_open_ack",
            InboundEvent::ChannelClosed { .. } => "channel_closed",
        }
    }

    /// The outbound packet an acknowledgement or timeout refers to
    pub fn packet(&self) -> Option<Packet> {
        match self {
            InboundEvent::Acknowledgement {
                port_id,
                channel_id,
                sequence,
                ..
            }
            | InboundEvent::Timeout {
                port_id,
                channel_id,
                sequence,
            } => Some(Packet::new(port_id.clone(), channel_id.clone(), *sequence)),
            _ => None,
        }
    }
}
