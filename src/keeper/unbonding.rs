//! Sweeping unbonded tokens to the redemption account

use super::Keeper;
use crate::callbacks::{CallbackArgs, RedemptionCallback};
use crate::error::{EngineError, EngineResult};
use crate::types::{BlockContext, Coin, HostMsg, HostZoneUnbondingStatus, IcaAccountType};

use tracing::{debug, info};

impl Keeper {
    /// Bank-send every fully unbonded amount waiting in the exit transfer
    /// queue from the delegation to the redemption account. Returns the
    /// packet sequence, or `None` when nothing has finished unbonding.
    pub fn sweep_unbonded_tokens(&mut self, ctx: &BlockContext, host_zone_id: &str) -> EngineResult<Option<u64>> {
        let host_zone = self.ledger.require_host_zone(host_zone_id)?.clone();

        let mut total: u128 = 0;
        let mut epoch_unbonding_record_ids = Vec::new();
        for record in self.ledger.all_epoch_unbonding_records() {
            let Some(unbonding) = record.host_zone_unbonding(host_zone_id) else {
                continue;
            };
            let ready = unbonding.status == HostZoneUnbondingStatus::ExitTransferQueue
                && unbonding.unbonding_time < ctx.time;
            if ready && unbonding.native_token_amount > 0 {
                debug!(
                    "[{}] Epoch {} unbonding of {} is ready to sweep",
                    host_zone_id, record.epoch_number, unbonding.native_token_amount
                );
                total = total
                    .checked_add(unbonding.native_token_amount)
                    .ok_or_else(|| EngineError::Overflow(format!("sweep total for {}", host_zone_id)))?;
                epoch_unbonding_record_ids.push(record.epoch_number);
            }
        }

        if total == 0 {
            debug!("[{}] No unbonded tokens to sweep", host_zone_id);
            return Ok(None);
        }

        let delegation_account = host_zone.require_account(IcaAccountType::Delegation)?.clone();
        let redemption_account = host_zone.require_account(IcaAccountType::Redemption)?;
        let msgs = vec![HostMsg::Send {
            from_address: delegation_account.address.clone(),
            to_address: redemption_account.address.clone(),
            amount: vec![Coin::new(total, host_zone.host_denom.clone())],
        }];

        info!(
            "[{}] Sweeping {}{} from epochs {:?}",
            host_zone_id, total, host_zone.host_denom, epoch_unbonding_record_ids
        );
        let callback = CallbackArgs::Redemption(RedemptionCallback {
            host_zone_id: host_zone_id.to_string(),
            epoch_unbonding_record_ids,
        });
        let sequence =
            self.submit_txs_day_epoch(&host_zone.connection_id, msgs, &delegation_account, Some(callback))?;
        Ok(Some(sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::PacketKey;
    use crate::testutil::{self, SECOND};
    use crate::types::{EpochUnbondingRecord, HostZoneUnbonding};

    fn unbonding(chain_id: &str, status: HostZoneUnbondingStatus, amount: u128, unbonding_time: u64) -> HostZoneUnbonding {
        HostZoneUnbonding {
            host_zone_id: chain_id.to_string(),
            status,
            native_token_amount: amount,
            st_token_amount: amount,
            unbonding_time,
            user_redemption_records: vec![],
        }
    }

    #[test]
    fn test_sweep_collects_finished_unbondings() {
        let (mut keeper, transport, _) = testutil::keeper();
        let ledger = keeper.ledger_mut();
        ledger.set_epoch_unbonding_record(EpochUnbondingRecord {
            epoch_number: 1,
            host_zone_unbondings: vec![
                unbonding("GAIA", HostZoneUnbondingStatus::ExitTransferQueue, 100, 10 * SECOND),
                unbonding("OSMO", HostZoneUnbondingStatus::ExitTransferQueue, 999, 10 * SECOND),
            ],
        });
        ledger.set_epoch_unbonding_record(EpochUnbondingRecord {
            epoch_number: 2,
            host_zone_unbondings: vec![unbonding("GAIA", HostZoneUnbondingStatus::ExitTransferQueue, 50, 20 * SECOND)],
        });
        ledger.set_epoch_unbonding_record(EpochUnbondingRecord {
            epoch_number: 3,
            // still unbonding on the host
            host_zone_unbondings: vec![unbonding("GAIA", HostZoneUnbondingStatus::ExitTransferQueue, 70, 90 * SECOND)],
        });
        ledger.set_epoch_unbonding_record(EpochUnbondingRecord {
            epoch_number: 4,
            host_zone_unbondings: vec![unbonding("GAIA", HostZoneUnbondingStatus::UnbondingQueue, 30, 0)],
        });

        let ctx = BlockContext::new(1, 30 * SECOND);
        let sequence = keeper.sweep_unbonded_tokens(&ctx, "GAIA").unwrap().unwrap();

        let sent = transport.sent_txs();
        assert_eq!(sent[0].messages()[0]["amount"][0]["amount"], 150);
        assert_eq!(sent[0].timeout_timestamp, 1_920 * SECOND);

        let key = PacketKey::new(&sent[0].port_id, testutil::ICA_CHANNEL_ID, sequence);
        let data = keeper.ledger().get_callback_data(&key).unwrap();
        let args = RedemptionCallback::decode(&data.callback_args).unwrap();
        assert_eq!(args.epoch_unbonding_record_ids, vec![1, 2]);
    }

    #[test]
    fn test_sweep_with_nothing_ready() {
        let (mut keeper, transport, _) = testutil::keeper();
        let ctx = BlockContext::new(1, 30 * SECOND);
        assert_eq!(keeper.sweep_unbonded_tokens(&ctx, "GAIA").unwrap(), None);
        assert!(transport.sent_txs().is_empty());
    }
}
