use super::decode_query_value;
use crate::epochs::STRIDE_EPOCH;
use crate::error::{EngineError, EngineResult};
use crate::icq::{HostDelegation, QueryOutcome, QueryResponse};
use crate::keeper::Keeper;
use crate::types::BlockContext;

use tracing::{info, warn};

/// Reconcile a validator's delegated amount against the host. A shortfall is
/// a slash: the amount, the zone's staked balance and the validator's weight
/// shrink together.
pub fn delegation_callback(
    keeper: &mut Keeper,
    _ctx: &BlockContext,
    value: &[u8],
    response: &QueryResponse,
) -> EngineResult<()> {
    let chain_id = response.chain_id.as_str();
    if response.outcome == QueryOutcome::Timeout {
        warn!("[{}] Delegation query timed out", chain_id);
        return Ok(());
    }

    let delegation: HostDelegation = decode_query_value(response, value)?;
    let invalid = |reason: String| EngineError::InvalidQueryResponse {
        callback_id: response.callback_id.clone(),
        reason,
    };

    let mut host_zone = keeper.ledger().require_host_zone(chain_id)?.clone();
    let epoch_number = keeper.current_epoch_number(STRIDE_EPOCH)?;
    let validator = host_zone
        .validator_mut(&delegation.validator_address)
        .ok_or_else(|| EngineError::ValidatorNotFound {
            chain_id: chain_id.to_string(),
            validator: delegation.validator_address.clone(),
        })?;

    let exchange_rate = validator
        .internal_exchange_rate
        .as_ref()
        .filter(|rate| rate.epoch_number == epoch_number)
        .ok_or_else(|| {
            invalid(format!(
                "exchange rate for {} not updated in epoch {}",
                validator.address, epoch_number
            ))
        })?;
    let delegated = delegation
        .shares
        .checked_mul(exchange_rate.rate)
        .ok_or_else(|| invalid(format!("delegation of {} shares overflows", delegation.shares)))?
        .to_int_truncate();

    let previous = validator.delegation_amt;
    if delegated > previous {
        return Err(invalid(format!(
            "delegation to {} grew from {} to {}",
            validator.address, previous, delegated
        )));
    }
    if delegated == previous {
        info!("[{}] No slash on {}, delegation is {}", chain_id, validator.address, previous);
        return Ok(());
    }

    let slash_amount = previous - delegated;
    let weight = u128::from(validator.weight)
        .checked_mul(delegated)
        .ok_or_else(|| EngineError::Overflow(format!("weight of {} scaled by {}", validator.address, delegated)))?
        / previous;
    let weight = u64::try_from(weight).map_err(|e| EngineError::Overflow(e.to_string()))?;
    warn!(
        "[{}] Validator {} was slashed by {} ({} -> {}), weight {} -> {}",
        chain_id, validator.address, slash_amount, previous, delegated, validator.weight, weight
    );
    validator.delegation_amt = delegated;
    validator.weight = weight;

    host_zone.staked_bal = host_zone
        .staked_bal
        .checked_sub(slash_amount)
        .ok_or_else(|| invalid(format!("slash of {} exceeds staked balance", slash_amount)))?;
    keeper.ledger_mut().set_host_zone(host_zone);
    Ok(())
}
