//! Block and epoch hooks

use super::Keeper;
use crate::epochs::{self, EpochTracker, DAY_EPOCH, STRIDE_EPOCH};
use crate::error::EngineError;
use crate::types::{BlockContext, DepositRecordStatus};

use tracing::{debug, error, info};

fn log_hook_error(host_zone_id: &str, hook: &str, err: &EngineError) {
    error!("[{}] {} failed: {}", host_zone_id, hook, err);
    crate::metrics::record_hook_error(host_zone_id, hook);
}

impl Keeper {
    /// Tick every due epoch and run its hooks. Hook failures are logged per
    /// host zone and never stop the block. Returns the epochs that started.
    pub fn begin_block(&mut self, ctx: &BlockContext) -> Vec<EpochTracker> {
        let started = epochs::advance_epochs(&mut self.ledger, ctx.time);

        for tracker in &started {
            info!(
                "Starting epoch {} #{} at height {}",
                tracker.epoch_identifier, tracker.epoch_number, ctx.height
            );
            crate::metrics::record_epoch_started(&tracker.epoch_identifier);

            match tracker.epoch_identifier.as_str() {
                STRIDE_EPOCH => self.on_stride_epoch(ctx, tracker.epoch_number),
                DAY_EPOCH => self.on_day_epoch(ctx),
                other => debug!("No hooks registered for epoch {}", other),
            }
        }

        started
    }

    fn on_stride_epoch(&mut self, ctx: &BlockContext, epoch_number: u64) {
        for host_zone in self.ledger.all_host_zones() {
            let chain_id = host_zone.chain_id.as_str();
            let records: Vec<_> = self
                .ledger
                .all_deposit_records()
                .into_iter()
                .filter(|r| r.host_zone_id == chain_id)
                .collect();

            // deposits collected in earlier epochs go to the host
            for record in records
                .iter()
                .filter(|r| r.status == DepositRecordStatus::Collecting && r.deposit_epoch_number < epoch_number)
                .filter(|r| r.amount > 0)
            {
                if let Err(e) = self.transfer_deposit_to_host(ctx, record.id) {
                    log_hook_error(chain_id, "transfer deposit", &e);
                }
            }

            for record in records
                .iter()
                .filter(|r| r.status == DepositRecordStatus::DelegationQueue)
            {
                if let Err(e) = self.delegate_on_host(ctx, record.id) {
                    log_hook_error(chain_id, "delegate", &e);
                }
            }

            if let Err(e) = self.set_withdrawal_address_on_host(ctx, chain_id) {
                log_hook_error(chain_id, "set withdrawal address", &e);
            }

            let interval = self.params.reinvest_interval;
            if interval > 0 && epoch_number % interval == 0 {
                if let Err(e) = self.update_withdrawal_balance(ctx, chain_id) {
                    log_hook_error(chain_id, "update withdrawal balance", &e);
                }
            }
        }
    }

    fn on_day_epoch(&mut self, ctx: &BlockContext) {
        for host_zone in self.ledger.all_host_zones() {
            if let Err(e) = self.sweep_unbonded_tokens(ctx, &host_zone.chain_id) {
                log_hook_error(&host_zone.chain_id, "sweep unbonded tokens", &e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, SECOND};
    use crate::types::DepositRecord;

    use tracing_test::traced_test;

    fn deposit(epoch: u64, status: DepositRecordStatus, amount: u128) -> DepositRecord {
        DepositRecord {
            id: 0,
            host_zone_id: testutil::HOST_ZONE.to_string(),
            amount,
            denom: testutil::HOST_DENOM.to_string(),
            deposit_epoch_number: epoch,
            status,
        }
    }

    #[test]
    fn test_stride_epoch_moves_deposits() {
        let (mut keeper, transport, querier) = testutil::keeper();
        let ledger = keeper.ledger_mut();
        let collected = ledger.append_deposit_record(deposit(1, DepositRecordStatus::Collecting, 300));
        let queued = ledger.append_deposit_record(deposit(1, DepositRecordStatus::DelegationQueue, 1_650));

        // before the boundary nothing happens
        assert!(keeper.begin_block(&BlockContext::new(1, 499 * SECOND)).is_empty());
        assert!(transport.sent_txs().is_empty());

        let started = keeper.begin_block(&BlockContext::new(2, 500 * SECOND));
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].epoch_number, 2);

        let ledger = keeper.ledger();
        assert_eq!(
            ledger.get_deposit_record(collected).unwrap().status,
            DepositRecordStatus::TransferInProgress
        );
        assert_eq!(
            ledger.get_deposit_record(queued).unwrap().status,
            DepositRecordStatus::DelegationInProgress
        );
        assert_eq!(transport.sent_transfers().len(), 1);

        // delegation then set-withdrawal-address
        assert_eq!(transport.sent_txs().len(), 2);
        assert_eq!(querier.requests()[0].callback_id, "withdrawalbalance");
    }

    #[test]
    fn test_current_epoch_deposits_keep_collecting() {
        let (mut keeper, transport, _) = testutil::keeper();
        let id = keeper
            .ledger_mut()
            .append_deposit_record(deposit(2, DepositRecordStatus::Collecting, 300));

        keeper.begin_block(&BlockContext::new(2, 500 * SECOND));
        assert_eq!(
            keeper.ledger().get_deposit_record(id).unwrap().status,
            DepositRecordStatus::Collecting
        );
        assert!(transport.sent_transfers().is_empty());
    }

    #[traced_test]
    #[test]
    fn test_hook_errors_are_logged_not_fatal() {
        let (mut keeper, transport, querier) = testutil::keeper();
        transport.fail_sends();
        let id = keeper
            .ledger_mut()
            .append_deposit_record(deposit(1, DepositRecordStatus::Collecting, 300));

        let started = keeper.begin_block(&BlockContext::new(2, 500 * SECOND));
        assert_eq!(started.len(), 1);
        assert_eq!(
            keeper.ledger().get_deposit_record(id).unwrap().status,
            DepositRecordStatus::Collecting
        );
        assert!(logs_contain("transfer deposit failed"));
        assert!(logs_contain("set withdrawal address failed"));

        // the query hook still ran
        assert_eq!(querier.requests().len(), 1);
    }
}
