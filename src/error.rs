//! Error types for the stakehub engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("host zone not found ({0})")]
    HostZoneNotFound(String),

    #[error("{account_type} account not found for host zone {chain_id}")]
    IcaAccountNotFound {
        chain_id: String,
        account_type: String,
    },

    #[error("fee account not registered for host zone {0}")]
    FeeAccountNotRegistered(String),

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to get epoch tracker for {0}")]
    EpochTrackerNotFound(String),

    #[error("Invalid buffer size {buffer} for epoch duration {duration}")]
    InvalidBufferSize { buffer: u64, duration: u64 },

    #[error("outside the buffer time during which ICQs are allowed ({0})")]
    OutsideQueryWindow(String),

    #[error("connection {0} not found")]
    ConnectionNotFound(String),

    #[error("failed to retrieve active channel for port {port_id} on {connection_id}")]
    ActiveChannelNotFound {
        connection_id: String,
        port_id: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("query submission error: {0}")]
    Query(String),

    #[error("no non-zero validator weights")]
    NoNonZeroValidatorWeights,

    #[error("no validator delegations found for host zone {0}, cannot rebalance 0 delegations")]
    NoValidatorDelegations(String),

    #[error("invalid number of rebalances {requested}, must be between 1 and {max}")]
    InvalidNumRebalance { requested: u64, max: u64 },

    #[error("validator {validator} not found on host zone {chain_id}")]
    ValidatorNotFound { chain_id: String, validator: String },

    #[error("quota exceeded on {channel_id} for {denom}: {direction} flow of {amount} exceeds threshold {threshold}")]
    QuotaExceeded {
        channel_id: String,
        denom: String,
        direction: String,
        amount: u128,
        threshold: u128,
    },

    #[error("rate limit not found for {denom} on {channel_id}")]
    RateLimitNotFound { denom: String, channel_id: String },

    #[error("rate limit already exists for {denom} on {channel_id}")]
    RateLimitAlreadyExists { denom: String, channel_id: String },

    #[error("{0}")]
    InvalidProposal(String),

    #[error("Unable to unmarshal {callback} callback args: {source}")]
    CallbackArgsDecode {
        callback: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("callback args for {expected} decoded as {found}")]
    CallbackArgsMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to encode callback args: {0}")]
    CallbackArgsEncode(#[source] serde_json::Error),

    #[error("invalid acknowledgement: {0}")]
    InvalidAcknowledgement(String),

    #[error("invalid query response for {callback_id}: {reason}")]
    InvalidQueryResponse { callback_id: String, reason: String },

    #[error("Error fetching host zone unbonding record for epoch: {epoch_number}, host zone: {chain_id}: host zone not found")]
    HostZoneUnbondingNotFound { epoch_number: u64, chain_id: String },

    #[error("epoch unbonding record not found for epoch {0}")]
    EpochUnbondingRecordNotFound(u64),

    #[error("deposit record {0} not found")]
    DepositRecordNotFound(u64),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("callback id {0} is already registered")]
    DuplicateCallbackId(String),

    #[error("callback {callback_id} failed: {source}")]
    CallbackFailed {
        callback_id: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Errors raised before any state was touched because the request itself
    /// could not be served.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidRequest(_)
                | EngineError::HostZoneNotFound(_)
                | EngineError::IcaAccountNotFound { .. }
                | EngineError::FeeAccountNotRegistered(_)
                | EngineError::InvalidAddress { .. }
                | EngineError::EpochTrackerNotFound(_)
                | EngineError::InvalidBufferSize { .. }
                | EngineError::OutsideQueryWindow(_)
                | EngineError::ConnectionNotFound(_)
                | EngineError::ActiveChannelNotFound { .. }
                | EngineError::NoNonZeroValidatorWeights
                | EngineError::NoValidatorDelegations(_)
                | EngineError::InvalidNumRebalance { .. }
                | EngineError::QuotaExceeded { .. }
                | EngineError::InvalidProposal(_)
        )
    }

    /// Errors that point at a broken ledger invariant rather than a remote
    /// condition. These should alert.
    pub fn is_consistency(&self) -> bool {
        match self {
            EngineError::HostZoneUnbondingNotFound { .. }
            | EngineError::EpochUnbondingRecordNotFound(_)
            | EngineError::DepositRecordNotFound(_)
            | EngineError::ValidatorNotFound { .. }
            | EngineError::InvalidStateTransition { .. } => true,
            EngineError::CallbackFailed { source, .. } => source.is_consistency(),
            _ => false,
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(EngineError::OutsideQueryWindow("GAIA".to_string()).is_precondition());
        assert!(!EngineError::OutsideQueryWindow("GAIA".to_string()).is_consistency());

        let wrapped = EngineError::CallbackFailed {
            callback_id: "redemption".to_string(),
            source: Box::new(EngineError::EpochUnbondingRecordNotFound(2)),
        };
        assert!(wrapped.is_consistency());
        assert!(!wrapped.is_precondition());
    }

    #[test]
    fn test_unbonding_not_found_message() {
        let err = EngineError::HostZoneUnbondingNotFound {
            epoch_number: 2,
            chain_id: "GAIA".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error fetching host zone unbonding record for epoch: 2, host zone: GAIA: host zone not found"
        );
    }
}
