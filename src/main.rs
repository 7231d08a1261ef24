//! Hostgate server
//!
//! Serves the tool dispatcher over HTTP against a simulated host.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hostgate::adapters::audit::sink_from_config;
use hostgate::adapters::http::{app_router, ToolsAppState};
use hostgate::adapters::simulated::SimulatedHost;
use hostgate::application::{GateSettings, HostPorts, ToolCatalog};
use hostgate::config::AppConfig;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let audit = sink_from_config(&config.audit)?;
    let settings = GateSettings {
        policy: config.gate.confirmation_policy(),
        operation_timeout: config.gate.operation_timeout(),
        audit,
    };

    let ports = HostPorts::from_host(Arc::new(SimulatedHost::seeded()));
    let catalog = ToolCatalog::build(&ports, &settings)?;
    let sweeper = catalog.spawn_expiry_sweeper(PURGE_INTERVAL);
    let dispatcher = catalog.dispatcher;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = ToolsAppState::new(Arc::new(dispatcher)).with_shutdown(shutdown_rx);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        audit = ?config.audit.destination,
        "hostgate listening"
    );

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            tracing::info!("shutdown requested, cancelling in-flight operations");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    sweeper.abort();
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
