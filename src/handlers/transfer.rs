use crate::callbacks::{AckResponse, AckStatus, Packet, TransferCallback};
use crate::error::{EngineError, EngineResult};
use crate::keeper::Keeper;
use crate::ratelimit;
use crate::types::{BlockContext, DepositRecordStatus};

use tracing::{info, warn};

/// Queue a transferred deposit for delegation, or return it to collecting so
/// the next stride epoch retries the transfer. A send that never arrived
/// gives its rate limit quota back.
pub fn transfer_callback(
    keeper: &mut Keeper,
    ctx: &BlockContext,
    packet: &Packet,
    ack: &AckResponse,
    args: &[u8],
) -> EngineResult<()> {
    let args = TransferCallback::decode(args)?;
    let mut record = keeper
        .ledger()
        .get_deposit_record(args.deposit_record_id)
        .cloned()
        .ok_or(EngineError::DepositRecordNotFound(args.deposit_record_id))?;

    record.status = match ack.status {
        AckStatus::Success => {
            info!(
                "[{}] Deposit record {} arrived on the host (packet {})",
                record.host_zone_id,
                record.id,
                packet.key()
            );
            DepositRecordStatus::DelegationQueue
        }
        status => {
            warn!(
                "[{}] Transfer of deposit record {} {}, back to collecting",
                record.host_zone_id, record.id, status
            );
            if let Some(send) = &args.rate_limited {
                ratelimit::undo_outflow(
                    keeper.ledger_mut(),
                    &send.channel_id,
                    &send.denom,
                    send.amount,
                    send.window_start,
                    ctx.time,
                );
            }
            DepositRecordStatus::Collecting
        }
    };
    keeper.ledger_mut().set_deposit_record(record);
    Ok(())
}
