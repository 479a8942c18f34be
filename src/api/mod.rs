//! HTTP API for health checks, status, and relayer exchange

use crate::config::ApiConfig;
use crate::engine::{Engine, EngineStatus, InboundEvent};
use crate::error::{EngineError, EngineResult};
use crate::outbox::OutboundPacket;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/events", post(submit_event))
        .route("/outbox/drain", post(drain_outbox))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, engine: Arc<Engine>) -> EngineResult<()> {
    let app = router(engine);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EngineError::Internal(format!("Failed to bind API server: {}", e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| EngineError::Internal(format!("API server error: {}", e)))?;

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine.status().await)
}

/// Queue an acknowledgement, timeout, query response or handshake result
async fn submit_event(State(state): State<AppState>, Json(event): Json<InboundEvent>) -> impl IntoResponse {
    let name = event.name();
    match state.engine.submit_event(event) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(EventResponse {
                accepted: true,
                error: None,
            }),
        ),
        Err(e) => {
            warn!("Rejected {} event: {}", name, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(EventResponse {
                    accepted: false,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Hand every queued outbound packet to the caller
async fn drain_outbox(State(state): State<AppState>) -> Result<Json<OutboxResponse>, StatusCode> {
    let packets = state.engine.outbox().drain().map_err(|e| {
        warn!("Failed to drain outbox: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(OutboxResponse { packets }))
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct EventResponse {
    accepted: bool,
    error: Option<String>,
}

#[derive(Serialize)]
struct OutboxResponse {
    packets: Vec<OutboundPacket>,
}
