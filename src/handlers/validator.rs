use super::decode_query_value;
use crate::epochs::STRIDE_EPOCH;
use crate::error::{EngineError, EngineResult};
use crate::icq::{HostValidator, QueryOutcome, QueryResponse};
use crate::keeper::Keeper;
use crate::types::{BlockContext, Dec, ExchangeRate};

use tracing::{info, warn};

/// Store a validator's tokens-per-share rate for this stride epoch, then
/// query our delegation with it.
pub fn validator_exchange_rate_callback(
    keeper: &mut Keeper,
    ctx: &BlockContext,
    value: &[u8],
    response: &QueryResponse,
) -> EngineResult<()> {
    let chain_id = response.chain_id.as_str();
    if response.outcome == QueryOutcome::Timeout {
        warn!("[{}] Validator exchange rate query timed out", chain_id);
        return Ok(());
    }

    let host_validator: HostValidator = decode_query_value(response, value)?;
    let mut host_zone = keeper.ledger().require_host_zone(chain_id)?.clone();
    let epoch_number = keeper.current_epoch_number(STRIDE_EPOCH)?;

    let invalid = |reason: String| EngineError::InvalidQueryResponse {
        callback_id: response.callback_id.clone(),
        reason,
    };
    let tokens = Dec::from_int(host_validator.tokens)
        .ok_or_else(|| invalid(format!("token amount {} out of range", host_validator.tokens)))?;
    let rate = tokens.checked_div(host_validator.delegator_shares).ok_or_else(|| {
        invalid(format!(
            "validator {} has no delegator shares",
            host_validator.operator_address
        ))
    })?;

    let validator = host_zone
        .validator_mut(&host_validator.operator_address)
        .ok_or_else(|| EngineError::ValidatorNotFound {
            chain_id: chain_id.to_string(),
            validator: host_validator.operator_address.clone(),
        })?;
    validator.internal_exchange_rate = Some(ExchangeRate { rate, epoch_number });
    info!(
        "[{}] Validator {} exchange rate is {} as of epoch {}",
        chain_id, host_validator.operator_address, rate, epoch_number
    );

    // persist only once the delegation query is submitted
    keeper.query_delegations(ctx, chain_id, &host_validator.operator_address)?;
    keeper.ledger_mut().set_host_zone(host_zone);
    Ok(())
}
