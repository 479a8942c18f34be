//! Interchain queries
//!
//! Proof-backed reads of host chain state. Requests carry a callback id and a
//! TTL; the response (or timeout) comes back as an inbound event and is
//! routed to the query callback registered under that id.

pub mod keys;
pub mod querier;

pub use keys::{balance_key, decode_address, delegation_key, validator_key};
pub use querier::{
    HostDelegation, HostValidator, InterchainQuerier, QueryOutcome, QueryRequest, QueryResponse, QueryType,
};

#[cfg(test)]
pub use querier::MockInterchainQuerier;

pub const VALIDATOR: &str = "validator";
pub const DELEGATION: &str = "delegation";
pub const WITHDRAWAL_BALANCE: &str = "withdrawalbalance";
