//! Packets and the acknowledgements delivered for them

use super::registry::PacketKey;
use crate::error::{EngineError, EngineResult};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outbound packet an outcome refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub source_port: String,
    pub source_channel: String,
    pub sequence: u64,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(source_port: impl Into<String>, source_channel: impl Into<String>, sequence: u64) -> Self {
        Self {
            source_port: source_port.into(),
            source_channel: source_channel.into(),
            sequence,
            data: Vec::new(),
        }
    }

    pub fn key(&self) -> PacketKey {
        PacketKey::new(self.source_port.clone(), self.source_channel.clone(), self.sequence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckStatus {
    Success,
    Failure,
    Timeout,
}

impl fmt::Display for AckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckStatus::Success => f.write_str("SUCCESS"),
            AckStatus::Failure => f.write_str("FAILURE"),
            AckStatus::Timeout => f.write_str("TIMEOUT"),
        }
    }
}

/// Wire form of an acknowledgement: `{"result": "<hex>"}` or `{"error": "..."}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Acknowledgement {
    Result(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckResponse {
    pub status: AckStatus,
    /// Raw result bytes returned by the host on success
    pub msg_responses: Vec<u8>,
    pub error: Option<String>,
}

impl AckResponse {
    pub fn success(msg_responses: Vec<u8>) -> Self {
        Self {
            status: AckStatus::Success,
            msg_responses,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Failure,
            msg_responses: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn timeout() -> Self {
        Self {
            status: AckStatus::Timeout,
            msg_responses: Vec::new(),
            error: None,
        }
    }

    /// Classify a raw acknowledgement. Anything that is neither a result nor
    /// an error is rejected.
    pub fn from_acknowledgement(bytes: &[u8]) -> EngineResult<Self> {
        let ack: Acknowledgement = serde_json::from_slice(bytes)
            .map_err(|e| EngineError::InvalidAcknowledgement(e.to_string()))?;

        match ack {
            Acknowledgement::Result(result) => {
                let msg_responses =
                    hex::decode(&result).map_err(|e| EngineError::InvalidAcknowledgement(e.to_string()))?;
                Ok(Self::success(msg_responses))
            }
            Acknowledgement::Error(error) => Ok(Self::failure(error)),
        }
    }
}
