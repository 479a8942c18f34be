//! Weight-proportional delegation targets and validator rebalancing

use super::Keeper;
use crate::callbacks::{CallbackArgs, RebalanceCallback, Rebalancing};
use crate::error::{EngineError, EngineResult};
use crate::types::{BlockContext, Coin, HostMsg, IcaAccountType, Validator};

use tracing::info;

/// Split `total` across validators in proportion to their weights.
///
/// Validators are visited in ascending weight order (stable on input order);
/// each gets its truncated share and the last absorbs the remainder, so the
/// targets always sum to `total`. The result is aligned with `validators`.
pub fn get_target_val_amts(validators: &[Validator], total: u128) -> EngineResult<Vec<u128>> {
    let total_weight: u128 = validators.iter().map(|v| v.weight as u128).sum();
    if total_weight == 0 {
        return Err(EngineError::NoNonZeroValidatorWeights);
    }

    let mut order: Vec<usize> = (0..validators.len()).collect();
    order.sort_by_key(|&i| validators[i].weight);

    let mut targets = vec![0u128; validators.len()];
    let mut allocated = 0u128;
    for (position, &i) in order.iter().enumerate() {
        let target = if position == order.len() - 1 {
            total - allocated
        } else {
            (validators[i].weight as u128)
                .checked_mul(total)
                .ok_or_else(|| EngineError::Overflow(format!("target for {}", validators[i].address)))?
                / total_weight
        };
        targets[i] = target;
        allocated += target;
    }

    Ok(targets)
}

/// Up to `num_rebalance` moves from over-target to under-target validators.
///
/// Greedy two-pointer over the surplus list (largest first) and the deficit
/// list (largest first), each stable on input order. Every move takes the
/// smaller of the current surplus and deficit.
pub fn compute_rebalancings(validators: &[Validator], num_rebalance: usize) -> EngineResult<Vec<Rebalancing>> {
    let total: u128 = validators.iter().map(|v| v.delegation_amt).sum();
    let targets = get_target_val_amts(validators, total)?;

    let deltas: Vec<i128> = validators
        .iter()
        .zip(&targets)
        .map(|(v, &target)| v.delegation_amt as i128 - target as i128)
        .collect();

    let mut surplus: Vec<(usize, u128)> = deltas
        .iter()
        .enumerate()
        .filter(|(_, &d)| d > 0)
        .map(|(i, &d)| (i, d as u128))
        .collect();
    surplus.sort_by(|a, b| b.1.cmp(&a.1));

    let mut deficit: Vec<(usize, u128)> = deltas
        .iter()
        .enumerate()
        .filter(|(_, &d)| d < 0)
        .map(|(i, &d)| (i, d.unsigned_abs()))
        .collect();
    deficit.sort_by(|a, b| b.1.cmp(&a.1));

    let mut rebalancings = Vec::new();
    let (mut over, mut under) = (0, 0);
    while rebalancings.len() < num_rebalance && over < surplus.len() && under < deficit.len() {
        let amt = surplus[over].1.min(deficit[under].1);
        rebalancings.push(Rebalancing {
            src_validator: validators[surplus[over].0].address.clone(),
            dst_validator: validators[deficit[under].0].address.clone(),
            amt,
        });

        surplus[over].1 -= amt;
        deficit[under].1 -= amt;
        if surplus[over].1 == 0 {
            over += 1;
        }
        if deficit[under].1 == 0 {
            under += 1;
        }
    }

    Ok(rebalancings)
}

impl Keeper {
    /// Redelegate towards weight-proportional targets with at most
    /// `num_rebalance` moves. Returns the moves submitted (none when the
    /// host zone is already balanced).
    pub fn rebalance_validators(
        &mut self,
        _ctx: &BlockContext,
        host_zone_id: &str,
        num_rebalance: u64,
    ) -> EngineResult<Vec<Rebalancing>> {
        let max = self.params.max_num_rebalance;
        if num_rebalance < 1 || num_rebalance > max {
            return Err(EngineError::InvalidNumRebalance {
                requested: num_rebalance,
                max,
            });
        }

        let host_zone = self.ledger.require_host_zone(host_zone_id)?.clone();
        if host_zone.total_validator_weight() == 0 {
            return Err(EngineError::NoNonZeroValidatorWeights);
        }
        if host_zone.total_validator_delegations() == 0 {
            return Err(EngineError::NoValidatorDelegations(host_zone_id.to_string()));
        }

        let rebalancings = compute_rebalancings(&host_zone.validators, num_rebalance as usize)?;
        if rebalancings.is_empty() {
            info!("[{}] Validators already balanced, nothing to redelegate", host_zone_id);
            return Ok(rebalancings);
        }

        let delegation_account = host_zone.require_account(IcaAccountType::Delegation)?.clone();
        let msgs = rebalancings
            .iter()
            .map(|r| HostMsg::BeginRedelegate {
                delegator_address: delegation_account.address.clone(),
                validator_src_address: r.src_validator.clone(),
                validator_dst_address: r.dst_validator.clone(),
                amount: Coin::new(r.amt, host_zone.host_denom.clone()),
            })
            .collect();

        let callback = CallbackArgs::Rebalance(RebalanceCallback {
            host_zone_id: host_zone_id.to_string(),
            rebalancings: rebalancings.clone(),
        });
        self.submit_txs_stride_epoch(&host_zone.connection_id, msgs, &delegation_account, Some(callback))?;

        info!("[{}] Submitted {} rebalancings", host_zone_id, rebalancings.len());
        Ok(rebalancings)
    }
}
