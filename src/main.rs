//! Synapse Server entry point.

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use synapse_server::config::{Config, LogFormat};
use synapse_server::{AppState, ServiceState};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }

    // The classifier is fully registered here, before any request is served.
    let service = ServiceState::standard();
    let state = AppState::new(service, config.cors_origins.clone());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        failure_handlers = state.classifier().registered_types().len(),
        "Synapse Server starting",
    );

    let app = synapse_server::router(state);

    let addr = SocketAddr::new(config.host.parse().expect("invalid host"), config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, "Synapse Server ready");

    if let Err(e) = synapse_server::serve(listener, app, shutdown_signal()).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("Synapse Server shut down");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install signal handler");
    tracing::info!("Shutdown signal received");
}
