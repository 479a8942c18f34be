use super::decode_query_value;
use crate::callbacks::{CallbackArgs, ReinvestCallback};
use crate::error::{EngineError, EngineResult};
use crate::icq::{QueryOutcome, QueryResponse};
use crate::keeper::Keeper;
use crate::types::{BlockContext, Coin, HostMsg, IcaAccountType};

use tracing::{info, warn};

/// Split the withdrawal account's rewards into commission for the fee
/// account and a reinvestment sent to the delegation account.
pub fn withdrawal_balance_callback(
    keeper: &mut Keeper,
    _ctx: &BlockContext,
    value: &[u8],
    response: &QueryResponse,
) -> EngineResult<()> {
    let chain_id = response.chain_id.as_str();
    if response.outcome == QueryOutcome::Timeout {
        warn!("[{}] Withdrawal balance query timed out", chain_id);
        return Ok(());
    }

    let balance: Coin = decode_query_value(response, value)?;
    if balance.amount == 0 {
        info!("[{}] No rewards in the withdrawal account", chain_id);
        return Ok(());
    }

    let host_zone = keeper.ledger().require_host_zone(chain_id)?.clone();
    let withdrawal_account = host_zone.require_account(IcaAccountType::Withdrawal)?;
    let fee_account = host_zone.require_account(IcaAccountType::Fee)?;
    let delegation_account = host_zone.require_account(IcaAccountType::Delegation)?;

    let commission_rate = keeper.params().stride_commission;
    if commission_rate > 100 {
        return Err(EngineError::InvalidRequest(format!(
            "commission of {}% is above 100%",
            commission_rate
        )));
    }
    let commission = balance
        .amount
        .checked_mul(u128::from(commission_rate))
        .ok_or_else(|| EngineError::Overflow(format!("commission on {}", balance)))?
        / 100;
    let reinvest = balance.amount - commission;
    info!(
        "[{}] Withdrawal balance {}: commission {}, reinvest {}",
        chain_id, balance, commission, reinvest
    );

    let mut msgs = Vec::new();
    if commission > 0 {
        msgs.push(HostMsg::Send {
            from_address: withdrawal_account.address.clone(),
            to_address: fee_account.address.clone(),
            amount: vec![Coin::new(commission, host_zone.host_denom.clone())],
        });
    }
    let mut callback = None;
    if reinvest > 0 {
        let reinvest_amount = Coin::new(reinvest, host_zone.host_denom.clone());
        msgs.push(HostMsg::Send {
            from_address: withdrawal_account.address.clone(),
            to_address: delegation_account.address.clone(),
            amount: vec![reinvest_amount.clone()],
        });
        callback = Some(CallbackArgs::Reinvest(ReinvestCallback {
            host_zone_id: chain_id.to_string(),
            reinvest_amount,
        }));
    }

    keeper.submit_txs_stride_epoch(&host_zone.connection_id, msgs, withdrawal_account, callback)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::PacketKey;
    use crate::testutil::{self, account_address};
    use crate::types::HostZone;

    fn response() -> QueryResponse {
        QueryResponse {
            module: "stakeibc".to_string(),
            callback_id: "withdrawalbalance".to_string(),
            chain_id: testutil::HOST_ZONE.to_string(),
            request_data: vec![],
            outcome: QueryOutcome::Value(vec![]),
        }
    }

    fn balance(amount: u128) -> Vec<u8> {
        serde_json::to_vec(&Coin::new(amount, testutil::HOST_DENOM)).unwrap()
    }

    #[test]
    fn test_rewards_split_and_reinvested() {
        let (mut keeper, transport, _) = testutil::keeper();
        withdrawal_balance_callback(&mut keeper, &BlockContext::new(1, 0), &balance(1_000), &response()).unwrap();

        let sent = transport.sent_txs();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].port_id, "icacontroller-GAIA.WITHDRAWAL");

        let msgs = sent[0].messages();
        assert_eq!(msgs[0]["to_address"], account_address(IcaAccountType::Fee));
        assert_eq!(msgs[0]["amount"][0]["amount"], 100);
        assert_eq!(msgs[1]["to_address"], account_address(IcaAccountType::Delegation));
        assert_eq!(msgs[1]["amount"][0]["amount"], 900);

        let key = PacketKey::new(&sent[0].port_id, testutil::ICA_CHANNEL_ID, sent[0].sequence);
        let data = keeper.ledger().get_callback_data(&key).unwrap();
        let args = ReinvestCallback::decode(&data.callback_args).unwrap();
        assert_eq!(args.reinvest_amount, Coin::new(900, testutil::HOST_DENOM));
    }

    #[test]
    fn test_empty_balance_and_timeout() {
        let (mut keeper, transport, _) = testutil::keeper();
        withdrawal_balance_callback(&mut keeper, &BlockContext::new(1, 0), &balance(0), &response()).unwrap();

        let mut timeout = response();
        timeout.outcome = QueryOutcome::Timeout;
        withdrawal_balance_callback(&mut keeper, &BlockContext::new(1, 0), &[], &timeout).unwrap();
        assert!(transport.sent_txs().is_empty());
    }

    #[test]
    fn test_missing_fee_account() {
        let (mut keeper, transport, _) = testutil::keeper();
        let host_zone = HostZone {
            fee_account: None,
            ..testutil::host_zone()
        };
        keeper.ledger_mut().set_host_zone(host_zone);

        assert!(matches!(
            withdrawal_balance_callback(&mut keeper, &BlockContext::new(1, 0), &balance(1_000), &response()),
            Err(EngineError::IcaAccountNotFound { .. })
        ));
        assert!(transport.sent_txs().is_empty());
    }
}
