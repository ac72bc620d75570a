use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Result;
use petstore_core::config::{AppConfig, LoadOptions};
use petstore_server::bootstrap;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use petstore_core::config::LogFormat::*;

    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "petstore-server listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app.router())
        .with_graceful_shutdown(async move {
            wait_for_shutdown().await;
            let _ = stopping_tx.send(true);
        })
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = async {
            let _ = stopping_rx.wait_for(|stopping| *stopping).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                graceful_shutdown_secs = grace.as_secs(),
                "connections still open after grace period; exiting"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "petstore-server stopped"
    );
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "shutdown signal received; draining connections"
    );
}
