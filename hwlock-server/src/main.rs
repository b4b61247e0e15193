//! hwlock license server
//!
//! Issues license keys, binds each to the first hardware id that activates it
//! and answers verification requests from licensed clients.
//!
//! Usage:
//!   ADMIN_KEY=... hwlock-server --port 5000 --database licenses.db

use anyhow::{Context, Result};
use clap::Parser;
use hwlock_server::{build_router, AppState, ServerArgs};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = args.into_config()?;
    info!("hwlock server starting...");
    let state = AppState::from_config(&config).context("failed to open license store")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    let local = listener.local_addr()?;
    info!("listening on {}", local);

    println!("\n========================================");
    println!("  hwlock License Server Running");
    println!("========================================");
    println!("  Address:   http://{}", local);
    println!("  Store:     {:?}", config.store);
    println!("  Key prefix: {}", config.engine.token_prefix);
    println!("========================================\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
