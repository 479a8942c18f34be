//! Proof-backed query contract

use crate::error::EngineResult;
use crate::types::Dec;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    StakingStoreQueryWithProof,
    BankStoreQueryWithProof,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::StakingStoreQueryWithProof => "store/staking/key",
            QueryType::BankStoreQueryWithProof => "store/bank/key",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read against a host chain store, answered asynchronously
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub module: String,
    pub callback_id: String,
    pub chain_id: String,
    pub connection_id: String,
    pub query_type: QueryType,
    /// Store key being proven
    pub request_data: Vec<u8>,
    /// Unix nanos after which the query times out
    pub ttl: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum QueryOutcome {
    Value(Vec<u8>),
    Timeout,
}

/// Delivered by the query layer once the proof checks out or the TTL passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub module: String,
    pub callback_id: String,
    pub chain_id: String,
    pub request_data: Vec<u8>,
    pub outcome: QueryOutcome,
}

/// Validator record as stored in the host's staking module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostValidator {
    pub operator_address: String,
    pub tokens: u128,
    pub delegator_shares: Dec,
}

/// Delegation record as stored in the host's staking module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDelegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub shares: Dec,
}

#[cfg_attr(test, mockall::automock)]
pub trait InterchainQuerier: Send + Sync {
    fn make_request(&self, request: QueryRequest) -> EngineResult<()>;
}
