//! Block loop driving the keeper

use super::events::InboundEvent;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::keeper::Keeper;
use crate::outbox::Outbox;
use crate::types::BlockContext;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

/// What happened in one block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub height: u64,
    pub epochs_started: Vec<String>,
    pub events_applied: usize,
    pub event_errors: usize,
}

/// Snapshot served by the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub instance_id: String,
    pub height: u64,
    pub host_zones: Vec<String>,
    pub pending_callbacks: usize,
    pub queued_outbound: usize,
    pub epochs: Vec<EpochStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochStatus {
    pub identifier: String,
    pub epoch_number: u64,
    pub next_epoch_start_time: u64,
}

/// Runs blocks on a fixed interval. Each block ticks epochs, runs their
/// hooks, then applies every inbound event queued since the last block, all
/// while holding the keeper exclusively.
pub struct Engine {
    keeper: Arc<Mutex<Keeper>>,
    outbox: Arc<Outbox>,
    events_tx: mpsc::Sender<InboundEvent>,
    events_rx: Mutex<mpsc::Receiver<InboundEvent>>,
    height: RwLock<u64>,
    config: EngineConfig,
    /// Shutdown flag
    shutdown: Arc<RwLock<bool>>,
}

impl Engine {
    pub fn new(keeper: Keeper, outbox: Arc<Outbox>, config: EngineConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_size.max(1));
        Self {
            keeper: Arc::new(Mutex::new(keeper)),
            outbox,
            events_tx,
            events_rx: Mutex::new(events_rx),
            height: RwLock::new(0),
            config,
            shutdown: Arc::new(RwLock::new(false)),
        }
    }

    /// Queue an event for the next block. Fails when the queue is full.
    pub fn submit_event(&self, event: InboundEvent) -> EngineResult<()> {
        crate::metrics::record_inbound_event(event.name());
        self.events_tx
            .try_send(event)
            .map_err(|e| EngineError::InvalidRequest(format!("event queue rejected event: {}", e)))
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    /// Main block loop
    pub async fn run(&self) -> EngineResult<()> {
        let mut block_interval = interval(Duration::from_millis(self.config.block_time_ms));
        let mut status_interval = interval(Duration::from_secs(60));

        info!("Engine {} started", self.config.instance_id);

        loop {
            if *self.shutdown.read().await {
                break;
            }

            tokio::select! {
                _ = block_interval.tick() => {
                    if let Err(e) = self.process_block(Utc::now()).await {
                        error!("Error processing block: {}", e);
                    }
                }

                _ = status_interval.tick() => {
                    let status = self.status().await;
                    info!(
                        "Height {}: {} pending callbacks, {} queued outbound",
                        status.height, status.pending_callbacks, status.queued_outbound
                    );
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Run one block at `time`
    pub async fn process_block(&self, time: DateTime<Utc>) -> EngineResult<BlockSummary> {
        let height = {
            let mut height = self.height.write().await;
            *height += 1;
            *height
        };
        let ctx = BlockContext::from_datetime(height, time);

        let mut events = Vec::new();
        {
            let mut rx = self.events_rx.lock().await;
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }

        let mut keeper = self.keeper.lock().await;
        let started = keeper.begin_block(&ctx);

        let mut summary = BlockSummary {
            height,
            epochs_started: started.into_iter().map(|t| t.epoch_identifier).collect(),
            ..BlockSummary::default()
        };

        for event in events {
            let name = event.name();
            match self.apply_event(&mut keeper, &ctx, event) {
                Ok(()) => summary.events_applied += 1,
                Err(e) => {
                    summary.event_errors += 1;
                    if e.is_consistency() {
                        error!("Block {}: {} event left the ledger inconsistent: {}", height, name, e);
                    } else {
                        warn!("Block {}: {} event failed: {}", height, name, e);
                    }
                }
            }
        }

        crate::metrics::record_block_processed(height);
        debug!("Processed block {:?}", summary);
        Ok(summary)
    }

    fn apply_event(&self, keeper: &mut Keeper, ctx: &BlockContext, event: InboundEvent) -> EngineResult<()> {
        let packet = event.packet();
        match event {
            InboundEvent::Acknowledgement { acknowledgement, .. } => {
                let bytes = serde_json::to_vec(&acknowledgement)
                    .map_err(|e| EngineError::InvalidAcknowledgement(e.to_string()))?;
                let packet = packet.ok_or_else(|| EngineError::Internal("acknowledgement without packet".to_string()))?;
                keeper.on_acknowledgement_packet(ctx, &packet, &bytes)
            }
            InboundEvent::Timeout { .. } => {
                let packet = packet.ok_or_else(|| EngineError::Internal("timeout without packet".to_string()))?;
                keeper.on_timeout_packet(ctx, &packet)
            }
            InboundEvent::QueryResponse(response) => keeper.on_query_response(ctx, &response),
            InboundEvent::ChannelOpenAck {
                connection_id,
                port_id,
                channel_id,
                address,
            } => {
                self.outbox.open_channel(&connection_id, &port_id, &channel_id);
                keeper.on_chan_open_ack(&port_id, &address)
            }
            InboundEvent::ChannelClosed { connection_id, port_id } => {
                self.outbox.close_channel(&connection_id, &port_id);
                Ok(())
            }
        }
    }

    /// Run `f` against the keeper between blocks
    pub async fn with_keeper<T>(&self, f: impl FnOnce(&mut Keeper) -> T) -> T {
        let mut keeper = self.keeper.lock().await;
        f(&mut keeper)
    }

    pub async fn status(&self) -> EngineStatus {
        let height = *self.height.read().await;
        let keeper = self.keeper.lock().await;
        let ledger = keeper.ledger();

        EngineStatus {
            instance_id: self.config.instance_id.clone(),
            height,
            host_zones: ledger.all_host_zones().into_iter().map(|h| h.chain_id).collect(),
            pending_callbacks: ledger.pending_callbacks(),
            queued_outbound: self.outbox.len(),
            epochs: ledger
                .all_epoch_trackers()
                .into_iter()
                .map(|t| EpochStatus {
                    identifier: t.epoch_identifier,
                    epoch_number: t.epoch_number,
                    next_epoch_start_time: t.next_epoch_start_time,
                })
                .collect(),
        }
    }

    /// Stop the engine
    pub async fn stop(&self) {
        let mut shutdown = self.shutdown.write().await;
        *shutdown = true;
        info!("Engine shutdown initiated");
    }
}
