//! Domain callback handlers
//!
//! Each handler decodes its own args, reverts optimistic state on a timeout
//! or failure, and applies the remote result on success. Handlers validate
//! everything they will touch before the first write, so an error leaves the
//! ledger as it was.

mod delegate;
mod delegation;
mod rebalance;
mod redemption;
mod reinvest;
mod transfer;
mod validator;
mod withdrawal_balance;

pub use delegate::delegate_callback;
pub use delegation::delegation_callback;
pub use rebalance::rebalance_callback;
pub use redemption::redemption_callback;
pub use reinvest::reinvest_callback;
pub use transfer::transfer_callback;
pub use validator::validator_exchange_rate_callback;
pub use withdrawal_balance::withdrawal_balance_callback;

use crate::callbacks::{args, CallbackTable, IcaCallbackFn, IcqCallbackFn};
use crate::error::{EngineError, EngineResult};
use crate::icq::{self, QueryResponse};

use serde::de::DeserializeOwned;

pub fn register_ica_callbacks(table: &mut CallbackTable<IcaCallbackFn>) -> EngineResult<()> {
    table.register(args::DELEGATE, delegate_callback)?;
    table.register(args::REBALANCE, rebalance_callback)?;
    table.register(args::REDEMPTION, redemption_callback)?;
    table.register(args::TRANSFER, transfer_callback)?;
    table.register(args::REINVEST, reinvest_callback)?;
    Ok(())
}

pub fn register_icq_callbacks(table: &mut CallbackTable<IcqCallbackFn>) -> EngineResult<()> {
    table.register(icq::VALIDATOR, validator_exchange_rate_callback)?;
    table.register(icq::DELEGATION, delegation_callback)?;
    table.register(icq::WITHDRAWAL_BALANCE, withdrawal_balance_callback)?;
    Ok(())
}

/// Decode the proven store value carried by a query response
fn decode_query_value<T: DeserializeOwned>(response: &QueryResponse, value: &[u8]) -> EngineResult<T> {
    serde_json::from_slice(value).map_err(|e| EngineError::InvalidQueryResponse {
        callback_id: response.callback_id.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_cover_every_callback() {
        let mut ica = CallbackTable::new();
        register_ica_callbacks(&mut ica).unwrap();
        assert_eq!(ica.ids(), vec!["delegate", "rebalance", "redemption", "reinvest", "transfer"]);

        let mut icq = CallbackTable::new();
        register_icq_callbacks(&mut icq).unwrap();
        assert_eq!(icq.ids(), vec!["delegation", "validator", "withdrawalbalance"]);

        // registering twice trips the duplicate check
        assert!(matches!(
            register_icq_callbacks(&mut icq),
            Err(EngineError::DuplicateCallbackId(_))
        ));
    }
}
