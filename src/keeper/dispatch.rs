//! Routing of packet outcomes and query responses to their callbacks

use super::Keeper;
use crate::callbacks::{AckResponse, CallbackData, Packet};
use crate::error::{EngineError, EngineResult};
use crate::icq::{QueryOutcome, QueryResponse};
use crate::types::{BlockContext, MODULE_NAME};

use tracing::{debug, error, info, warn};

fn finish_callback(callback_id: &str, status: &str, result: EngineResult<()>) -> EngineResult<()> {
    match result {
        Ok(()) => {
            crate::metrics::record_callback(callback_id, status);
            Ok(())
        }
        Err(e) => {
            error!("Callback {} ({}) failed: {}", callback_id, status, e);
            crate::metrics::record_callback_error(callback_id);
            Err(EngineError::CallbackFailed {
                callback_id: callback_id.to_string(),
                source: Box::new(e),
            })
        }
    }
}

impl Keeper {
    /// Handle the acknowledgement of an outbound packet. The pending entry is
    /// consumed before the acknowledgement is decoded, so a malformed
    /// acknowledgement still resolves the call.
    pub fn on_acknowledgement_packet(
        &mut self,
        ctx: &BlockContext,
        packet: &Packet,
        acknowledgement: &[u8],
    ) -> EngineResult<()> {
        let Some(data) = self.take_callback_data(packet) else {
            return Ok(());
        };

        let ack = AckResponse::from_acknowledgement(acknowledgement).map_err(|e| {
            error!("Dropping {} callback for packet {}: {}", data.callback_id, data.key(), e);
            crate::metrics::record_callback_error(&data.callback_id);
            e
        })?;
        self.dispatch_ica(ctx, packet, &ack, data)
    }

    /// Handle a packet that timed out before it was acknowledged
    pub fn on_timeout_packet(&mut self, ctx: &BlockContext, packet: &Packet) -> EngineResult<()> {
        let Some(data) = self.take_callback_data(packet) else {
            return Ok(());
        };
        self.dispatch_ica(ctx, packet, &AckResponse::timeout(), data)
    }

    /// Route a query response (or its timeout) to the query callback
    /// registered under its callback id.
    pub fn on_query_response(&mut self, ctx: &BlockContext, response: &QueryResponse) -> EngineResult<()> {
        if response.module != MODULE_NAME {
            debug!("Ignoring query response for module {}", response.module);
            return Ok(());
        }
        let Some(handler) = self.icq_callbacks.get(&response.callback_id) else {
            warn!(
                "[{}] No query callback registered for {}",
                response.chain_id, response.callback_id
            );
            return Ok(());
        };

        let (status, value) = match &response.outcome {
            QueryOutcome::Value(value) => ("SUCCESS", value.as_slice()),
            QueryOutcome::Timeout => ("TIMEOUT", &[][..]),
        };
        info!(
            "[{}] Running {} query callback ({})",
            response.chain_id, response.callback_id, status
        );
        let result = handler(self, ctx, value, response);
        finish_callback(&response.callback_id, status, result)
    }

    fn take_callback_data(&mut self, packet: &Packet) -> Option<CallbackData> {
        let key = packet.key();
        match self.ledger.delete_callback_data(&key) {
            Some(data) => {
                crate::metrics::set_pending_callbacks(self.ledger.pending_callbacks());
                Some(data)
            }
            None => {
                debug!("No callback data registered for packet {}", key);
                None
            }
        }
    }

    fn dispatch_ica(
        &mut self,
        ctx: &BlockContext,
        packet: &Packet,
        ack: &AckResponse,
        data: CallbackData,
    ) -> EngineResult<()> {
        let Some(handler) = self.ica_callbacks.get(&data.callback_id) else {
            warn!("No callback registered for {} (packet {})", data.callback_id, data.key());
            return Ok(());
        };

        info!(
            "Running {} callback for packet {} with status {}",
            data.callback_id,
            data.key(),
            ack.status
        );
        let result = handler(self, ctx, packet, ack, &data.callback_args);
        finish_callback(&data.callback_id, &ack.status.to_string(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{CallbackArgs, PacketKey, RedemptionCallback};
    use crate::icq::QueryOutcome;
    use crate::testutil::{self, SECOND};

    const PORT: &str = "icacontroller-GAIA.DELEGATION";

    fn pending(keeper: &mut Keeper, sequence: u64, callback_id: &str, callback_args: Vec<u8>) -> Packet {
        keeper.ledger_mut().set_callback_data(CallbackData {
            port_id: PORT.to_string(),
            channel_id: testutil::ICA_CHANNEL_ID.to_string(),
            sequence,
            callback_id: callback_id.to_string(),
            callback_args,
        });
        Packet::new(PORT, testutil::ICA_CHANNEL_ID, sequence)
    }

    fn redemption_args(ids: Vec<u64>) -> Vec<u8> {
        CallbackArgs::Redemption(RedemptionCallback {
            host_zone_id: testutil::HOST_ZONE.to_string(),
            epoch_unbonding_record_ids: ids,
        })
        .encode()
        .unwrap()
    }

    fn ctx() -> BlockContext {
        BlockContext::new(3, 50 * SECOND)
    }

    #[test]
    fn test_unknown_packet_is_ignored() {
        let (mut keeper, _, _) = testutil::keeper();
        let before = keeper.ledger().clone();

        let packet = Packet::new(PORT, testutil::ICA_CHANNEL_ID, 9);
        keeper
            .on_acknowledgement_packet(&ctx(), &packet, br#"{"result":""}"#)
            .unwrap();
        keeper.on_timeout_packet(&ctx(), &packet).unwrap();
        assert_eq!(keeper.ledger(), &before);
    }

    #[test]
    fn test_invalid_acknowledgement_consumes_entry() {
        let (mut keeper, _, _) = testutil::keeper();
        let packet = pending(&mut keeper, 1, "redemption", redemption_args(vec![1]));

        let err = keeper
            .on_acknowledgement_packet(&ctx(), &packet, b"not an ack")
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAcknowledgement(_)));
        assert!(keeper
            .ledger()
            .get_callback_data(&PacketKey::new(PORT, testutil::ICA_CHANNEL_ID, 1))
            .is_none());
    }

    #[test]
    fn test_unregistered_callback_id() {
        let (mut keeper, _, _) = testutil::keeper();
        let packet = pending(&mut keeper, 2, "undelegate", b"{}".to_vec());

        keeper.on_timeout_packet(&ctx(), &packet).unwrap();
        assert_eq!(keeper.ledger().pending_callbacks(), 0);
    }

    #[test]
    fn test_handler_error_is_wrapped() {
        let (mut keeper, _, _) = testutil::keeper();
        let packet = pending(&mut keeper, 3, "redemption", redemption_args(vec![7]));

        let err = keeper
            .on_acknowledgement_packet(&ctx(), &packet, br#"{"result":"0a"}"#)
            .unwrap_err();
        match err {
            EngineError::CallbackFailed { callback_id, source } => {
                assert_eq!(callback_id, "redemption");
                assert!(source.is_consistency());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_query_response_for_other_module() {
        let (mut keeper, _, _) = testutil::keeper();
        let before = keeper.ledger().clone();
        let response = QueryResponse {
            module: "interchainquery".to_string(),
            callback_id: "validator".to_string(),
            chain_id: testutil::HOST_ZONE.to_string(),
            request_data: vec![],
            outcome: QueryOutcome::Timeout,
        };
        keeper.on_query_response(&ctx(), &response).unwrap();
        assert_eq!(keeper.ledger(), &before);
    }
}
