use crate::callbacks::{AckResponse, AckStatus, Packet, ReinvestCallback};
use crate::epochs::STRIDE_EPOCH;
use crate::error::EngineResult;
use crate::keeper::Keeper;
use crate::types::{BlockContext, DepositRecord, DepositRecordStatus};

use tracing::{info, warn};

/// Queue reinvested rewards for delegation. The rewards already sit in the
/// delegation account, so the record skips the transfer step.
pub fn reinvest_callback(
    keeper: &mut Keeper,
    _ctx: &BlockContext,
    packet: &Packet,
    ack: &AckResponse,
    args: &[u8],
) -> EngineResult<()> {
    let args = ReinvestCallback::decode(args)?;
    let chain_id = args.host_zone_id.as_str();

    if ack.status != AckStatus::Success {
        warn!("[{}] Reinvestment {} for packet {}", chain_id, ack.status, packet.key());
        return Ok(());
    }

    keeper.ledger().require_host_zone(chain_id)?;
    let epoch_number = keeper.current_epoch_number(STRIDE_EPOCH)?;
    let id = keeper.ledger_mut().append_deposit_record(DepositRecord {
        id: 0,
        host_zone_id: chain_id.to_string(),
        amount: args.reinvest_amount.amount,
        denom: args.reinvest_amount.denom.clone(),
        deposit_epoch_number: epoch_number,
        status: DepositRecordStatus::DelegationQueue,
    });
    info!(
        "[{}] Reinvesting {} through deposit record {}",
        chain_id, args.reinvest_amount, id
    );
    Ok(())
}
