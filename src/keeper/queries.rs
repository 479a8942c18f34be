//! Interchain query submission

use super::Keeper;
use crate::epochs::STRIDE_EPOCH;
use crate::error::{EngineError, EngineResult};
use crate::icq::{self, QueryRequest, QueryType};
use crate::types::{BlockContext, IcaAccountType, MODULE_NAME};

use tracing::{error, info};

impl Keeper {
    fn require_buffer_window(&self, ctx: &BlockContext, host_zone_id: &str) -> EngineResult<()> {
        if !self.is_within_buffer_window(ctx.time)? {
            return Err(EngineError::OutsideQueryWindow(host_zone_id.to_string()));
        }
        Ok(())
    }

    fn make_request(&self, request: QueryRequest) -> EngineResult<()> {
        let chain_id = request.chain_id.clone();
        let callback_id = request.callback_id.clone();
        self.querier.make_request(request).map_err(|e| {
            error!("[{}] Error submitting ICQ for {}: {}", chain_id, callback_id, e);
            e
        })?;
        crate::metrics::record_icq_request(&chain_id, &callback_id);
        Ok(())
    }

    /// Query a validator's tokens and shares. Only allowed in the buffer
    /// window at the end of the stride epoch.
    pub fn query_validator_exchange_rate(
        &self,
        ctx: &BlockContext,
        host_zone_id: &str,
        valoper: &str,
    ) -> EngineResult<()> {
        info!("[{}] Submitting ICQ for validator exchange rate to {}", host_zone_id, valoper);
        self.require_buffer_window(ctx, host_zone_id)?;

        let host_zone = self.ledger.require_host_zone(host_zone_id)?;
        let validator = icq::decode_address(valoper, &host_zone.bech32_prefix)?;
        let request = QueryRequest {
            module: MODULE_NAME.to_string(),
            callback_id: icq::VALIDATOR.to_string(),
            chain_id: host_zone.chain_id.clone(),
            connection_id: host_zone.connection_id.clone(),
            query_type: QueryType::StakingStoreQueryWithProof,
            request_data: icq::validator_key(&validator)?,
            ttl: self.get_start_time_next_epoch(STRIDE_EPOCH)?,
        };
        self.make_request(request)
    }

    /// Query the delegation account's shares with a validator. Issued after
    /// the validator's exchange rate has been refreshed.
    pub fn query_delegations(&self, ctx: &BlockContext, host_zone_id: &str, valoper: &str) -> EngineResult<()> {
        info!("[{}] Submitting ICQ for delegations to {}", host_zone_id, valoper);
        self.require_buffer_window(ctx, host_zone_id)?;

        let host_zone = self.ledger.require_host_zone(host_zone_id)?;
        let delegation_account = host_zone.require_account(IcaAccountType::Delegation)?;
        let validator = icq::decode_address(valoper, &host_zone.bech32_prefix)?;
        let delegator = icq::decode_address(&delegation_account.address, &host_zone.bech32_prefix)?;

        let request = QueryRequest {
            module: MODULE_NAME.to_string(),
            callback_id: icq::DELEGATION.to_string(),
            chain_id: host_zone.chain_id.clone(),
            connection_id: host_zone.connection_id.clone(),
            query_type: QueryType::StakingStoreQueryWithProof,
            request_data: icq::delegation_key(&delegator, &validator)?,
            ttl: self.get_start_time_next_epoch(STRIDE_EPOCH)?,
        };
        self.make_request(request)
    }

    /// Query the withdrawal account's balance of the host denom. Times out at
    /// the end of the stride epoch's ICA window.
    pub fn update_withdrawal_balance(&self, _ctx: &BlockContext, host_zone_id: &str) -> EngineResult<()> {
        info!("[{}] Submitting ICQ for withdrawal account balance", host_zone_id);

        let host_zone = self.ledger.require_host_zone(host_zone_id)?;
        let withdrawal_account = host_zone.require_account(IcaAccountType::Withdrawal)?;
        let address = icq::decode_address(&withdrawal_account.address, &host_zone.bech32_prefix)?;

        let request = QueryRequest {
            module: MODULE_NAME.to_string(),
            callback_id: icq::WITHDRAWAL_BALANCE.to_string(),
            chain_id: host_zone.chain_id.clone(),
            connection_id: host_zone.connection_id.clone(),
            query_type: QueryType::BankStoreQueryWithProof,
            request_data: icq::balance_key(&address, &host_zone.host_denom)?,
            ttl: self.ica_timeout_nanos(STRIDE_EPOCH)?,
        };
        self.make_request(request)
    }
}
