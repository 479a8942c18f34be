//! Remote transaction dispatch

use super::Keeper;
use crate::callbacks::{CallbackArgs, CallbackData};
use crate::epochs::{DAY_EPOCH, STRIDE_EPOCH};
use crate::error::{EngineError, EngineResult};
use crate::ica::{ica_owner, ica_port_id, InterchainAccountPacketData};
use crate::types::{HostMsg, IcaAccount};

use tracing::{debug, error, info};

impl Keeper {
    /// Send `msgs` as one tx executed by `account`, registering `callback`
    /// against the packet when given. Returns the packet sequence.
    ///
    /// The send and the callback write are not atomic: if the write were lost
    /// the packet would resolve with no handler, which only loses the ledger
    /// update for that call.
    pub fn submit_txs(
        &mut self,
        connection_id: &str,
        msgs: Vec<HostMsg>,
        account: &IcaAccount,
        timeout_timestamp: u64,
        callback: Option<CallbackArgs>,
    ) -> EngineResult<u64> {
        let chain_id = self.transport.counterparty_chain_id(connection_id)?;
        let owner = ica_owner(&chain_id, account.target);
        let port_id = ica_port_id(&owner);

        info!(
            "[{}] Submitting ICA Tx on {}, {} with TTL: {}",
            chain_id, port_id, connection_id, timeout_timestamp
        );
        for msg in &msgs {
            debug!("[{}]     Msg: {:?}", chain_id, msg);
        }

        let channel_id = self
            .transport
            .get_active_channel_id(connection_id, &port_id)
            .ok_or_else(|| EngineError::ActiveChannelNotFound {
                connection_id: connection_id.to_string(),
                port_id: port_id.clone(),
            })?;

        let packet = InterchainAccountPacketData::execute_tx(&msgs)?;
        let callback = match callback {
            Some(args) => Some((args.callback_id(), args.encode()?)),
            None => None,
        };

        let sequence = self
            .transport
            .send_tx(connection_id, &port_id, packet, timeout_timestamp)?;
        crate::metrics::record_ica_tx_submitted(&chain_id, account.target.as_str());

        if let Some((callback_id, callback_args)) = callback {
            let data = CallbackData {
                port_id,
                channel_id,
                sequence,
                callback_id: callback_id.to_string(),
                callback_args,
            };
            info!("[{}] Storing callback data for {}", chain_id, data.key());
            self.ledger.set_callback_data(data);
            crate::metrics::set_pending_callbacks(self.ledger.pending_callbacks());
        }

        Ok(sequence)
    }

    /// Submit with a TTL just before the next `epoch_identifier` boundary
    pub fn submit_txs_epoch(
        &mut self,
        connection_id: &str,
        msgs: Vec<HostMsg>,
        account: &IcaAccount,
        epoch_identifier: &str,
        callback: Option<CallbackArgs>,
    ) -> EngineResult<u64> {
        let timeout = self.ica_timeout_nanos(epoch_identifier).map_err(|e| {
            error!("Failed to get ICA timeout nanos for epochType {}: {}", epoch_identifier, e);
            e
        })?;
        self.submit_txs(connection_id, msgs, account, timeout, callback)
    }

    pub fn submit_txs_stride_epoch(
        &mut self,
        connection_id: &str,
        msgs: Vec<HostMsg>,
        account: &IcaAccount,
        callback: Option<CallbackArgs>,
    ) -> EngineResult<u64> {
        self.submit_txs_epoch(connection_id, msgs, account, STRIDE_EPOCH, callback)
    }

    pub fn submit_txs_day_epoch(
        &mut self,
        connection_id: &str,
        msgs: Vec<HostMsg>,
        account: &IcaAccount,
        callback: Option<CallbackArgs>,
    ) -> EngineResult<u64> {
        self.submit_txs_epoch(connection_id, msgs, account, DAY_EPOCH, callback)
    }
}
