use crate::callbacks::{AckResponse, AckStatus, Packet, RebalanceCallback};
use crate::error::{EngineError, EngineResult};
use crate::keeper::Keeper;
use crate::types::BlockContext;

use tracing::{info, warn};

/// Move delegated amounts between validators once the redelegations landed
pub fn rebalance_callback(
    keeper: &mut Keeper,
    _ctx: &BlockContext,
    packet: &Packet,
    ack: &AckResponse,
    args: &[u8],
) -> EngineResult<()> {
    let args = RebalanceCallback::decode(args)?;
    let chain_id = args.host_zone_id.as_str();
    info!("[{}] Rebalance callback for packet {}", chain_id, packet.key());

    if ack.status != AckStatus::Success {
        warn!("[{}] Rebalance {}, delegations unchanged", chain_id, ack.status);
        return Ok(());
    }

    let mut host_zone = keeper.ledger().require_host_zone(chain_id)?.clone();
    for rebalancing in &args.rebalancings {
        let not_found = |validator: &str| EngineError::ValidatorNotFound {
            chain_id: chain_id.to_string(),
            validator: validator.to_string(),
        };

        let src = host_zone
            .validator_mut(&rebalancing.src_validator)
            .ok_or_else(|| not_found(&rebalancing.src_validator))?;
        src.delegation_amt = src.delegation_amt.checked_sub(rebalancing.amt).ok_or_else(|| {
            EngineError::Overflow(format!("redelegating {} from {}", rebalancing.amt, rebalancing.src_validator))
        })?;

        let dst = host_zone
            .validator_mut(&rebalancing.dst_validator)
            .ok_or_else(|| not_found(&rebalancing.dst_validator))?;
        dst.delegation_amt = dst
            .delegation_amt
            .checked_add(rebalancing.amt)
            .ok_or_else(|| EngineError::Overflow(format!("redelegating to {}", rebalancing.dst_validator)))?;

        info!(
            "[{}] Moved {} from {} to {}",
            chain_id, rebalancing.amt, rebalancing.src_validator, rebalancing.dst_validator
        );
    }

    keeper.ledger_mut().set_host_zone(host_zone);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{CallbackArgs, Rebalancing};
    use crate::testutil::{self, valoper};

    fn args(rebalancings: Vec<Rebalancing>) -> Vec<u8> {
        CallbackArgs::Rebalance(RebalanceCallback {
            host_zone_id: testutil::HOST_ZONE.to_string(),
            rebalancings,
        })
        .encode()
        .unwrap()
    }

    fn packet() -> Packet {
        Packet::new("icacontroller-GAIA.DELEGATION", testutil::ICA_CHANNEL_ID, 1)
    }

    fn delegations(keeper: &Keeper) -> Vec<u128> {
        let host_zone = keeper.ledger().get_host_zone(testutil::HOST_ZONE).unwrap();
        host_zone.validators.iter().map(|v| v.delegation_amt).collect()
    }

    #[test]
    fn test_rebalance_success() {
        let (mut keeper, _, _) = testutil::keeper();
        let args = args(vec![
            Rebalancing {
                src_validator: valoper(3),
                dst_validator: valoper(1),
                amt: 104,
            },
            Rebalancing {
                src_validator: valoper(4),
                dst_validator: valoper(1),
                amt: 13,
            },
        ]);
        rebalance_callback(&mut keeper, &BlockContext::new(1, 0), &packet(), &AckResponse::success(vec![]), &args)
            .unwrap();

        assert_eq!(delegations(&keeper), vec![217, 500, 96, 387, 400]);
        assert_eq!(
            keeper.ledger().get_host_zone(testutil::HOST_ZONE).unwrap().staked_bal,
            1_600
        );
    }

    #[test]
    fn test_rebalance_timeout() {
        let (mut keeper, _, _) = testutil::keeper();
        let args = args(vec![Rebalancing {
            src_validator: valoper(3),
            dst_validator: valoper(1),
            amt: 104,
        }]);
        rebalance_callback(&mut keeper, &BlockContext::new(1, 0), &packet(), &AckResponse::timeout(), &args).unwrap();
        assert_eq!(delegations(&keeper), vec![100, 500, 200, 400, 400]);
    }

    #[test]
    fn test_rebalance_missing_validator_changes_nothing() {
        let (mut keeper, _, _) = testutil::keeper();
        let before = keeper.ledger().clone();
        let args = args(vec![Rebalancing {
            src_validator: valoper(3),
            dst_validator: valoper(8),
            amt: 104,
        }]);
        let err = rebalance_callback(
            &mut keeper,
            &BlockContext::new(1, 0),
            &packet(),
            &AckResponse::success(vec![]),
            &args,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ValidatorNotFound { .. }));
        assert_eq!(keeper.ledger(), &before);
    }
}
