use crate::callbacks::{AckResponse, AckStatus, Packet, RedemptionCallback};
use crate::error::{EngineError, EngineResult};
use crate::keeper::Keeper;
use crate::types::{BlockContext, HostZoneUnbondingStatus};

use tracing::{error, info};

/// Mark swept unbondings claimable. Every referenced epoch is checked before
/// any record is written.
pub fn redemption_callback(
    keeper: &mut Keeper,
    _ctx: &BlockContext,
    packet: &Packet,
    ack: &AckResponse,
    args: &[u8],
) -> EngineResult<()> {
    let args = RedemptionCallback::decode(args)?;
    let chain_id = args.host_zone_id.as_str();
    info!("[{}] Redemption callback for packet {}", chain_id, packet.key());

    match ack.status {
        AckStatus::Timeout => {
            // the sweep is retried on the next day epoch
            info!("[{}] Redemption sweep timed out, records stay in the exit transfer queue", chain_id);
            return Ok(());
        }
        AckStatus::Failure => {
            error!(
                "[{}] Redemption sweep failed: {}",
                chain_id,
                ack.error.as_deref().unwrap_or("no error")
            );
            return Ok(());
        }
        AckStatus::Success => {}
    }

    let mut updates = Vec::with_capacity(args.epoch_unbonding_record_ids.len());
    for &epoch_number in &args.epoch_unbonding_record_ids {
        if keeper.ledger().get_epoch_unbonding_record(epoch_number).is_none() {
            error!("[{}] Epoch unbonding record {} not found", chain_id, epoch_number);
            return Err(EngineError::EpochUnbondingRecordNotFound(epoch_number));
        }
        let mut unbonding = keeper
            .ledger()
            .get_host_zone_unbonding(epoch_number, chain_id)?
            .clone();
        if unbonding.status != HostZoneUnbondingStatus::ExitTransferQueue {
            return Err(EngineError::InvalidStateTransition {
                from: unbonding.status.to_string(),
                to: HostZoneUnbondingStatus::Claimable.to_string(),
            });
        }
        unbonding.status = HostZoneUnbondingStatus::Claimable;
        updates.push((epoch_number, unbonding));
    }

    for (epoch_number, unbonding) in updates {
        keeper.ledger_mut().set_host_zone_unbonding(epoch_number, unbonding)?;
        info!("[{}] Epoch {} unbonding is now claimable", chain_id, epoch_number);
    }
    Ok(())
}
