//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Block and epoch progress
//! - Interchain account txs and interchain queries
//! - Callback outcomes and errors
//! - Rate limit rejections

use crate::error::{EngineError, EngineResult};

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, CounterVec, Encoder, GaugeVec, TextEncoder,
};
use std::net::SocketAddr;
use tracing::{error, info};

lazy_static! {
    // Block metrics
    pub static ref BLOCK_HEIGHT: GaugeVec = register_gauge_vec!(
        "stakehub_block_height",
        "Height of the last processed block",
        &[]
    ).unwrap();

    pub static ref EPOCHS_STARTED: CounterVec = register_counter_vec!(
        "stakehub_epochs_started_total",
        "Total epochs started by identifier",
        &["epoch"]
    ).unwrap();

    pub static ref HOOK_ERRORS: CounterVec = register_counter_vec!(
        "stakehub_hook_errors_total",
        "Total epoch hook failures",
        &["host_zone", "hook"]
    ).unwrap();

    // Remote call metrics
    pub static ref ICA_TX_SUBMITTED: CounterVec = register_counter_vec!(
        "stakehub_ica_txs_submitted_total",
        "Total interchain account txs submitted",
        &["host_zone", "account"]
    ).unwrap();

    pub static ref ICQ_REQUESTS: CounterVec = register_counter_vec!(
        "stakehub_icq_requests_total",
        "Total interchain queries submitted",
        &["host_zone", "callback_id"]
    ).unwrap();

    pub static ref PENDING_CALLBACKS: GaugeVec = register_gauge_vec!(
        "stakehub_pending_callbacks",
        "Submitted calls waiting for an outcome",
        &[]
    ).unwrap();

    // Callback metrics
    pub static ref CALLBACKS: CounterVec = register_counter_vec!(
        "stakehub_callbacks_total",
        "Total callbacks run by id and outcome status",
        &["callback_id", "status"]
    ).unwrap();

    pub static ref CALLBACK_ERRORS: CounterVec = register_counter_vec!(
        "stakehub_callback_errors_total",
        "Total callbacks that returned an error",
        &["callback_id"]
    ).unwrap();

    pub static ref INBOUND_EVENTS: CounterVec = register_counter_vec!(
        "stakehub_inbound_events_total",
        "Total inbound events received by type",
        &["event_type"]
    ).unwrap();

    // Rate limit metrics
    pub static ref RATE_LIMIT_REJECTIONS: CounterVec = register_counter_vec!(
        "stakehub_rate_limit_rejections_total",
        "Total transfers rejected by a rate limit",
        &["channel_id", "denom"]
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> EngineResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| EngineError::Internal(format!("Failed to bind metrics server: {}", e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| EngineError::Internal(format!("Metrics server error: {}", e)))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    gather_text().map_err(|e| {
        error!("Failed to encode metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Text exposition of every registered metric
pub fn gather_text() -> EngineResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| EngineError::Internal(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| EngineError::Internal(e.to_string()))
}

// Helper functions to record metrics

pub fn record_block_processed(height: u64) {
    BLOCK_HEIGHT.with_label_values(&[]).set(height as f64);
}

pub fn record_epoch_started(epoch: &str) {
    EPOCHS_STARTED.with_label_values(&[epoch]).inc();
}

pub fn record_hook_error(host_zone: &str, hook: &str) {
    HOOK_ERRORS.with_label_values(&[host_zone, hook]).inc();
}

pub fn record_ica_tx_submitted(host_zone: &str, account: &str) {
    ICA_TX_SUBMITTED.with_label_values(&[host_zone, account]).inc();
}

pub fn record_icq_request(host_zone: &str, callback_id: &str) {
    ICQ_REQUESTS.with_label_values(&[host_zone, callback_id]).inc();
}

pub fn set_pending_callbacks(count: usize) {
    PENDING_CALLBACKS.with_label_values(&[]).set(count as f64);
}

pub fn record_callback(callback_id: &str, status: &str) {
    CALLBACKS.with_label_values(&[callback_id, status]).inc();
}

pub fn record_callback_error(callback_id: &str) {
    CALLBACK_ERRORS.with_label_values(&[callback_id]).inc();
}

pub fn record_inbound_event(event_type: &str) {
    INBOUND_EVENTS.with_label_values(&[event_type]).inc();
}

pub fn record_rate_limit_rejection(channel_id: &str, denom: &str) {
    RATE_LIMIT_REJECTIONS.with_label_values(&[channel_id, denom]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_metrics_are_exposed() {
        record_callback("redemption", "SUCCESS");
        record_rate_limit_rejection("channel-0", "ibc/uatom");

        let text = gather_text().unwrap();
        assert!(text.contains("stakehub_callbacks_total"));
        assert!(text.contains(r#"channel_id="channel-0""#));
    }
}
