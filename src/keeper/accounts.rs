//! Interchain account lifecycle and account-level host operations

use super::Keeper;
use crate::error::{EngineError, EngineResult};
use crate::ica::{ica_owner, ica_port_id, TRANSFER_PORT};
use crate::types::{BlockContext, Coin, HostMsg, IcaAccount, IcaAccountType};

use tracing::{error, info, warn};

const ALL_ACCOUNT_TYPES: [IcaAccountType; 4] = [
    IcaAccountType::Delegation,
    IcaAccountType::Fee,
    IcaAccountType::Withdrawal,
    IcaAccountType::Redemption,
];

impl Keeper {
    /// Open the controller channel for one of a host zone's accounts
    pub fn register_interchain_account(&mut self, host_zone_id: &str, account_type: IcaAccountType) -> EngineResult<()> {
        let host_zone = self.ledger.require_host_zone(host_zone_id)?;
        let owner = ica_owner(&host_zone.chain_id, account_type);
        info!("[{}] Registering interchain account {}", host_zone_id, owner);
        self.transport
            .register_interchain_account(&host_zone.connection_id, &owner)
    }

    /// Reopen an account whose ordered channel closed after a timeout. The
    /// account keeps its address on the host.
    pub fn restore_interchain_account(&mut self, host_zone_id: &str, account_type: IcaAccountType) -> EngineResult<()> {
        let host_zone = self.ledger.require_host_zone(host_zone_id)?;
        let owner = ica_owner(&host_zone.chain_id, account_type);
        let port_id = ica_port_id(&owner);

        if let Some(channel_id) = self.transport.get_active_channel_id(&host_zone.connection_id, &port_id) {
            return Err(EngineError::InvalidRequest(format!(
                "existing active channel {} for portID {} must be CLOSED prior to restoring",
                channel_id, port_id
            )));
        }

        self.transport
            .register_interchain_account(&host_zone.connection_id, &owner)
            .map_err(|e| {
                error!("[{}] Unable to register {} account: {}", host_zone_id, account_type, e);
                e
            })?;
        info!("[{}] Restoring {} account on {}", host_zone_id, account_type, port_id);
        Ok(())
    }

    /// Record the host address of an account once its channel handshake
    /// completes on `port_id`.
    pub fn on_chan_open_ack(&mut self, port_id: &str, address: &str) -> EngineResult<()> {
        let owner = port_id
            .strip_prefix("icacontroller-")
            .ok_or_else(|| EngineError::InvalidRequest(format!("{} is not a controller port", port_id)))?;

        for mut host_zone in self.ledger.all_host_zones() {
            let Some(account_type) = ALL_ACCOUNT_TYPES
                .into_iter()
                .find(|&t| ica_owner(&host_zone.chain_id, t) == owner)
            else {
                continue;
            };

            let account = Some(IcaAccount::new(address, account_type));
            match account_type {
                IcaAccountType::Delegation => host_zone.delegation_account = account,
                IcaAccountType::Fee => host_zone.fee_account = account,
                IcaAccountType::Withdrawal => host_zone.withdrawal_account = account,
                IcaAccountType::Redemption => host_zone.redemption_account = account,
            }
            info!("[{}] {} account registered at {}", host_zone.chain_id, account_type, address);
            self.ledger.set_host_zone(host_zone);
            return Ok(());
        }

        Err(EngineError::HostZoneNotFound(owner.to_string()))
    }

    /// Point the delegation account's rewards at the withdrawal account. A
    /// zone missing either account is skipped.
    pub fn set_withdrawal_address_on_host(&mut self, _ctx: &BlockContext, host_zone_id: &str) -> EngineResult<()> {
        let host_zone = self.ledger.require_host_zone(host_zone_id)?.clone();
        let (Ok(delegation_account), Ok(withdrawal_account)) = (
            host_zone.require_account(IcaAccountType::Delegation),
            host_zone.require_account(IcaAccountType::Withdrawal),
        ) else {
            warn!("[{}] Zone is missing a delegation or withdrawal address", host_zone_id);
            return Ok(());
        };

        info!(
            "[{}] Withdrawal Address: {}, Delegator Address: {}",
            host_zone_id, withdrawal_account.address, delegation_account.address
        );
        let msgs = vec![HostMsg::SetWithdrawAddress {
            delegator_address: delegation_account.address.clone(),
            withdraw_address: withdrawal_account.address.clone(),
        }];
        self.submit_txs_stride_epoch(&host_zone.connection_id, msgs, &delegation_account.clone(), None)?;
        Ok(())
    }

    /// Sweep `amount` of the host denom out of the fee account over `channel_id`
    pub fn clear_balance(
        &mut self,
        ctx: &BlockContext,
        host_zone_id: &str,
        channel_id: &str,
        amount: u128,
    ) -> EngineResult<u64> {
        let host_zone = self.ledger.require_host_zone(host_zone_id)?.clone();
        let fee_account = host_zone
            .fee_account
            .clone()
            .ok_or_else(|| EngineError::FeeAccountNotRegistered(host_zone_id.to_string()))?;
        if amount == 0 {
            return Err(EngineError::InvalidRequest("amount must be positive".to_string()));
        }

        let transfer_timeout = Self::offset_timeout(ctx.time, self.params.fee_transfer_timeout_nanos)?;
        let ica_timeout = Self::offset_timeout(ctx.time, self.params.ica_timeout_nanos)?;

        let msgs = vec![HostMsg::Transfer {
            source_port: TRANSFER_PORT.to_string(),
            source_channel: channel_id.to_string(),
            token: Coin::new(amount, host_zone.host_denom.clone()),
            sender: fee_account.address.clone(),
            receiver: self.params.fee_receiver_address.clone(),
            timeout_timestamp: transfer_timeout,
        }];
        self.submit_txs(&host_zone.connection_id, msgs, &fee_account, ica_timeout, None)
    }
}
