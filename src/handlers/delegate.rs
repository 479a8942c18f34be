use crate::callbacks::{AckResponse, AckStatus, DelegateCallback, Packet};
use crate::error::{EngineError, EngineResult};
use crate::keeper::Keeper;
use crate::types::{BlockContext, DepositRecordStatus};

use tracing::{info, warn};

/// Credit delegated amounts to validators and complete the deposit record.
/// On timeout or failure the record goes back to the delegation queue.
pub fn delegate_callback(
    keeper: &mut Keeper,
    _ctx: &BlockContext,
    packet: &Packet,
    ack: &AckResponse,
    args: &[u8],
) -> EngineResult<()> {
    let args = DelegateCallback::decode(args)?;
    let chain_id = args.host_zone_id.as_str();
    info!(
        "[{}] Delegate callback for packet {}, deposit record {}",
        chain_id,
        packet.key(),
        args.deposit_record_id
    );

    let mut record = keeper
        .ledger()
        .get_deposit_record(args.deposit_record_id)
        .cloned()
        .ok_or(EngineError::DepositRecordNotFound(args.deposit_record_id))?;

    if ack.status != AckStatus::Success {
        warn!(
            "[{}] Delegation {}: {}, returning deposit record {} to the queue",
            chain_id,
            ack.status,
            ack.error.as_deref().unwrap_or("no error"),
            record.id
        );
        record.status = DepositRecordStatus::DelegationQueue;
        keeper.ledger_mut().set_deposit_record(record);
        return Ok(());
    }

    let mut host_zone = keeper.ledger().require_host_zone(chain_id)?.clone();
    let mut total: u128 = 0;
    for split in &args.split_delegations {
        let validator = host_zone
            .validator_mut(&split.validator)
            .ok_or_else(|| EngineError::ValidatorNotFound {
                chain_id: chain_id.to_string(),
                validator: split.validator.clone(),
            })?;
        validator.delegation_amt = validator
            .delegation_amt
            .checked_add(split.amount)
            .ok_or_else(|| EngineError::Overflow(format!("delegation to {}", split.validator)))?;
        total = total
            .checked_add(split.amount)
            .ok_or_else(|| EngineError::Overflow("delegation total".to_string()))?;
    }
    host_zone.staked_bal = host_zone
        .staked_bal
        .checked_add(total)
        .ok_or_else(|| EngineError::Overflow(format!("staked balance of {}", chain_id)))?;

    info!("[{}] Delegated {} across {} validators", chain_id, total, args.split_delegations.len());
    keeper.ledger_mut().set_host_zone(host_zone);
    keeper.ledger_mut().remove_deposit_record(record.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{CallbackArgs, SplitDelegation};
    use crate::testutil::{self, valoper};
    use crate::types::DepositRecord;

    fn setup() -> (Keeper, u64, Vec<u8>) {
        let (mut keeper, _, _) = testutil::keeper();
        let id = keeper.ledger_mut().append_deposit_record(DepositRecord {
            id: 0,
            host_zone_id: testutil::HOST_ZONE.to_string(),
            amount: 300,
            denom: testutil::HOST_DENOM.to_string(),
            deposit_epoch_number: 1,
            status: DepositRecordStatus::DelegationInProgress,
        });
        let args = CallbackArgs::Delegate(DelegateCallback {
            host_zone_id: testutil::HOST_ZONE.to_string(),
            deposit_record_id: id,
            split_delegations: vec![
                SplitDelegation {
                    validator: valoper(1),
                    amount: 200,
                },
                SplitDelegation {
                    validator: valoper(2),
                    amount: 100,
                },
            ],
        })
        .encode()
        .unwrap();
        (keeper, id, args)
    }

    fn packet() -> Packet {
        Packet::new("icacontroller-GAIA.DELEGATION", testutil::ICA_CHANNEL_ID, 1)
    }

    #[test]
    fn test_delegate_success() {
        let (mut keeper, id, args) = setup();
        let ctx = BlockContext::new(1, 0);
        delegate_callback(&mut keeper, &ctx, &packet(), &AckResponse::success(vec![]), &args).unwrap();

        let host_zone = keeper.ledger().get_host_zone(testutil::HOST_ZONE).unwrap();
        assert_eq!(host_zone.staked_bal, 1_900);
        assert_eq!(host_zone.validator(&valoper(1)).unwrap().delegation_amt, 300);
        assert_eq!(host_zone.validator(&valoper(2)).unwrap().delegation_amt, 600);
        assert!(keeper.ledger().get_deposit_record(id).is_none());
    }

    #[test]
    fn test_delegate_timeout_and_failure_requeue() {
        for ack in [AckResponse::timeout(), AckResponse::failure("out of gas")] {
            let (mut keeper, id, args) = setup();
            let ctx = BlockContext::new(1, 0);
            delegate_callback(&mut keeper, &ctx, &packet(), &ack, &args).unwrap();

            let record = keeper.ledger().get_deposit_record(id).unwrap();
            assert_eq!(record.status, DepositRecordStatus::DelegationQueue);
            assert_eq!(keeper.ledger().get_host_zone(testutil::HOST_ZONE).unwrap().staked_bal, 1_600);
        }
    }

    #[test]
    fn test_delegate_unknown_validator_changes_nothing() {
        let (mut keeper, id, _) = setup();
        let args = CallbackArgs::Delegate(DelegateCallback {
            host_zone_id: testutil::HOST_ZONE.to_string(),
            deposit_record_id: id,
            split_delegations: vec![
                SplitDelegation {
                    validator: valoper(1),
                    amount: 200,
                },
                SplitDelegation {
                    validator: valoper(9),
                    amount: 100,
                },
            ],
        })
        .encode()
        .unwrap();
        let before = keeper.ledger().clone();

        let err = delegate_callback(
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
