//! Stakehub engine - cross-chain execution for a liquid-staking hub
//!
//! Runs the block loop, the relayer-facing API and the metrics server.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use stakehub_engine::api;
use stakehub_engine::config::Settings;
use stakehub_engine::engine::Engine;
use stakehub_engine::keeper::Keeper;
use stakehub_engine::metrics::MetricsServer;
use stakehub_engine::outbox::Outbox;
use stakehub_engine::ratelimit::add_rate_limit;
use stakehub_engine::state::Ledger;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Stakehub Engine v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration for {} host zones over {} connections",
        settings.host_zones.len(),
        settings.connections.len()
    );

    // Bootstrap the ledger
    let mut ledger = Ledger::new();
    for epoch in &settings.epochs {
        ledger.set_epoch_tracker(epoch.to_tracker());
    }
    for host_zone in &settings.host_zones {
        ledger.set_host_zone(host_zone.to_host_zone());
    }
    let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().max(0) as u64;
    for rate_limit in &settings.rate_limits {
        add_rate_limit(&mut ledger, &rate_limit.to_proposal(), rate_limit.channel_value as u128, now)?;
    }

    let outbox = Arc::new(Outbox::new(settings.connections.clone()));
    let keeper = Keeper::new(ledger, settings.params.clone(), outbox.clone(), outbox.clone())?;
    let engine = Arc::new(Engine::new(keeper, outbox, settings.engine.clone()));
    info!("Engine initialized");

    // Start API server
    let api_handle = tokio::spawn({
        let config = settings.api.clone();
        let engine = engine.clone();
        async move {
            if let Err(e) = api::run_server(config, engine).await {
                error!("API server error: {}", e);
            }
        }
    });

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    // Start block loop
    let engine_handle = tokio::spawn({
        let engine = engine.clone();
        async move {
            if let Err(e) = engine.run().await {
                error!("Engine error: {}", e);
            }
        }
    });

    info!("Stakehub Engine is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    // Graceful shutdown
    engine.stop().await;

    // Abort background tasks
    api_handle.abort();
    engine_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Stakehub Engine stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stakehub_engine=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
