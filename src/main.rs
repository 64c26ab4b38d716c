//! Gatekeeper - authentication front door
//! Mission: Issue short-lived tokens to verified users and guard everything else

use anyhow::{Context, Result};
use clap::Parser;
use gatekeeper_backend::{
    app::{build_router, AppState},
    config::{init_tracing, load_env, AppConfig},
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = AppConfig::parse();
    info!("🚀 Gatekeeper starting on {}", config.bind_addr);

    let state = AppState::from_config(&config)?;

    // Forget idle rate-limit entries in the background
    let limiter = state.login_limit.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            limiter.cleanup();
        }
    });

    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("✅ Listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
