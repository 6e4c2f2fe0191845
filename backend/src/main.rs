mod api;
mod config;
mod error;
mod models;
mod services;
mod storage;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Settings, ACTOR_NAME};
use services::{sweeper::Sweeper, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load env vars
    dotenv().ok();

    // initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("{} start", ACTOR_NAME);

    let settings = Settings::from_env()?;
    tracing::info!("Ledger RPC at {}", settings.rpc_url);

    let state = AppState::new(&settings)
        .await
        .context("Failed to initialize node state")?;

    let static_dir = settings.html_dir.is_dir().then_some(settings.html_dir.as_path());
    if static_dir.is_none() {
        tracing::warn!("Static directory {} not found, serving API only", settings.html_dir.display());
    }
    let app = api::router(state.clone(), static_dir);

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("{} listening on {}", ACTOR_NAME, addr);

    let stop = Arc::new(AtomicBool::new(false));

    tokio::spawn(watch_interrupt(tokio::signal::ctrl_c(), stop.clone()));

    let sweeper = Sweeper::new(state.reservations.clone(), settings.sweep_interval, stop.clone()).spawn();

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_stop(stop))
        .await
        .context("HTTP server failed")?;

    if let Err(e) = sweeper.await {
        tracing::error!("Sweeper task failed: {}", e);
    }

    tracing::info!("{} stop", ACTOR_NAME);
    Ok(())
}

/// Raises the stop flag once `signal` fires. A handler that cannot be
/// installed leaves the node serving.
async fn watch_interrupt<F>(signal: F, stop: Arc<AtomicBool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        return;
    }
    tracing::info!("Interrupt received, shutting down...");
    stop.store(true, Ordering::SeqCst);
}

async fn wait_for_stop(stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
