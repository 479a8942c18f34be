//! Deposit records: collection on the hub, transfer to the host, delegation

use super::rebalance::get_target_val_amts;
use super::Keeper;
use crate::callbacks::{
    CallbackArgs, CallbackData, DelegateCallback, RateLimitedSend, SplitDelegation, TransferCallback,
};
use crate::epochs::STRIDE_EPOCH;
use crate::error::{EngineError, EngineResult};
use crate::ica::{FungibleTokenPacketData, TRANSFER_PORT};
use crate::ratelimit::{self, FlowDirection};
use crate::types::{BlockContext, Coin, DepositRecord, DepositRecordStatus, HostMsg, IcaAccountType};

use tracing::{debug, info};

fn require_status(record: &DepositRecord, expected: DepositRecordStatus, next: DepositRecordStatus) -> EngineResult<()> {
    if record.status != expected {
        return Err(EngineError::InvalidStateTransition {
            from: record.status.to_string(),
            to: next.to_string(),
        });
    }
    Ok(())
}

impl Keeper {
    /// Add `amount` to this stride epoch's collecting record for the host
    /// zone, creating the record if needed. Returns the record id.
    pub fn record_deposit(&mut self, _ctx: &BlockContext, host_zone_id: &str, amount: u128) -> EngineResult<u64> {
        if amount == 0 {
            return Err(EngineError::InvalidRequest("deposit amount must be positive".to_string()));
        }
        let host_zone = self.ledger.require_host_zone(host_zone_id)?;
        let denom = host_zone.host_denom.clone();
        let epoch_number = self.current_epoch_number(STRIDE_EPOCH)?;

        let existing = self.ledger.all_deposit_records().into_iter().find(|r| {
            r.host_zone_id == host_zone_id
                && r.deposit_epoch_number == epoch_number
                && r.status == DepositRecordStatus::Collecting
        });

        match existing {
            Some(mut record) => {
                record.amount = record
                    .amount
                    .checked_add(amount)
                    .ok_or_else(|| EngineError::Overflow(format!("deposit record {}", record.id)))?;
                let id = record.id;
                debug!("[{}] Deposit record {} now holds {}", host_zone_id, id, record.amount);
                self.ledger.set_deposit_record(record);
                Ok(id)
            }
            None => {
                let id = self.ledger.append_deposit_record(DepositRecord {
                    id: 0,
                    host_zone_id: host_zone_id.to_string(),
                    amount,
                    denom,
                    deposit_epoch_number: epoch_number,
                    status: DepositRecordStatus::Collecting,
                });
                info!("[{}] Opened deposit record {} for epoch {}", host_zone_id, id, epoch_number);
                Ok(id)
            }
        }
    }

    /// Move a collecting deposit to the host's delegation account over the
    /// transfer channel. The send is checked against the channel's rate limit.
    pub fn transfer_deposit_to_host(&mut self, ctx: &BlockContext, deposit_record_id: u64) -> EngineResult<u64> {
        let mut record = self
            .ledger
            .get_deposit_record(deposit_record_id)
            .cloned()
            .ok_or(EngineError::DepositRecordNotFound(deposit_record_id))?;
        require_status(
            &record,
            DepositRecordStatus::Collecting,
            DepositRecordStatus::TransferInProgress,
        )?;
        if record.amount == 0 {
            return Err(EngineError::InvalidRequest(format!(
                "deposit record {} is empty",
                deposit_record_id
            )));
        }

        let host_zone = self.ledger.require_host_zone(&record.host_zone_id)?.clone();
        let delegation_account = host_zone.require_account(IcaAccountType::Delegation)?;
        let timeout = Self::offset_timeout(ctx.time, self.params.ibc_transfer_timeout_nanos)?;

        let rate_limit = ratelimit::preview_flow(
            &self.ledger,
            &host_zone.transfer_channel_id,
            &host_zone.ibc_denom,
            FlowDirection::Send,
            record.amount,
            ctx.time,
        )?;
        let callback_args = CallbackArgs::Transfer(TransferCallback {
            deposit_record_id,
            rate_limited: rate_limit.as_ref().map(|rate_limit| RateLimitedSend {
                denom: rate_limit.path.denom.clone(),
                channel_id: rate_limit.path.channel_id.clone(),
                amount: record.amount,
                window_start: rate_limit.window_start,
            }),
        })
        .encode()?;

        let packet = FungibleTokenPacketData {
            denom: host_zone.ibc_denom.clone(),
            amount: record.amount.to_string(),
            sender: host_zone.deposit_address.clone(),
            receiver: delegation_account.address.clone(),
            memo: String::new(),
        };
        let sequence = self
            .transport
            .send_transfer(TRANSFER_PORT, &host_zone.transfer_channel_id, packet, timeout)?;

        if let Some(rate_limit) = rate_limit {
            self.ledger.set_rate_limit(rate_limit);
        }
        record.status = DepositRecordStatus::TransferInProgress;
        self.ledger.set_deposit_record(record);
        self.ledger.set_callback_data(CallbackData {
            port_id: TRANSFER_PORT.to_string(),
            channel_id: host_zone.transfer_channel_id.clone(),
            sequence,
            callback_id: crate::callbacks::args::TRANSFER.to_string(),
            callback_args,
        });
        crate::metrics::set_pending_callbacks(self.ledger.pending_callbacks());

        info!(
            "[{}] Transferring deposit record {} on {} (sequence {})",
            host_zone.chain_id, deposit_record_id, host_zone.transfer_channel_id, sequence
        );
        Ok(sequence)
    }

    /// Delegate a queued deposit across validators by target weight
    pub fn delegate_on_host(&mut self, _ctx: &BlockContext, deposit_record_id: u64) -> EngineResult<u64> {
        let mut record = self
            .ledger
            .get_deposit_record(deposit_record_id)
            .cloned()
            .ok_or(EngineError::DepositRecordNotFound(deposit_record_id))?;
        require_status(
            &record,
            DepositRecordStatus::DelegationQueue,
            DepositRecordStatus::DelegationInProgress,
        )?;

        let host_zone = self.ledger.require_host_zone(&record.host_zone_id)?.clone();
        let delegation_account = host_zone.require_account(IcaAccountType::Delegation)?.clone();
        let targets = get_target_val_amts(&host_zone.validators, record.amount)?;

        let mut msgs = Vec::new();
        let mut split_delegations = Vec::with_capacity(targets.len());
        for (validator, &amount) in host_zone.validators.iter().zip(&targets) {
            if amount > 0 {
                msgs.push(HostMsg::Delegate {
                    delegator_address: delegation_account.address.clone(),
                    validator_address: validator.address.clone(),
                    amount: Coin::new(amount, host_zone.host_denom.clone()),
                });
            }
            split_delegations.push(SplitDelegation {
                validator: validator.address.clone(),
                amount,
            });
        }
        if msgs.is_empty() {
            return Err(EngineError::InvalidRequest(format!(
                "deposit record {} has nothing to delegate",
                deposit_record_id
            )));
        }
        info!(
            "[{}] Preparing {} MsgDelegates from the delegation account",
            host_zone.chain_id,
            msgs.len()
        );

        let callback = CallbackArgs::Delegate(DelegateCallback {
            host_zone_id: host_zone.chain_id.clone(),
            deposit_record_id,
            split_delegations,
        });
        let sequence =
            self.submit_txs_stride_epoch(&host_zone.connection_id, msgs, &delegation_account, Some(callback))?;

        record.status = DepositRecordStatus::DelegationInProgress;
        self.ledger.set_deposit_record(record);
        Ok(sequence)
    }
}
