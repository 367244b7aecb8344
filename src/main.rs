//! Bonus Proposals API
//!
//! Submit and look up employee bonus proposals. Enforces one proposal per
//! employee per calendar month, the `ATS0NNN` employee id format, a minimum
//! bonus of 100 and a consistent name per employee id.

mod bonus;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod state;

use crate::bonus::{BonusService, PgBonusStore};
use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting Bonus Proposals API...");

    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    // The server never starts without a reachable, initialized database
    let pool = match db::connect_with_retry(&settings.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ FATAL: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = db::initialize_schema(&pool, settings.database.reset_schema).await {
        error!("❌ FATAL: {}", e);
        return Err(e.into());
    }

    let store = Arc::new(PgBonusStore::new(pool));
    let state = Arc::new(AppState::new(BonusService::new(store)));

    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("📚 API Endpoints:");
    info!("   GET  /api/health          - Health check");
    info!("   GET  /api/bonuses         - List all bonus proposals");
    info!("   GET  /api/bonuses/search  - Search by employeeID (and employeeName)");
    info!("   POST /api/bonuses         - Submit a bonus proposal");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bonus_proposals_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
