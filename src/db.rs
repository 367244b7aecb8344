//! Database connection management
//!
//! Builds the connection pool, waits for the database at startup and
//! initializes the schema. Everything here runs once before the server
//! accepts requests; failures are fatal and reported as [`InitError`].

pub mod queries;

use crate::config::DatabaseConfig;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use thiserror::Error;
use tokio_postgres::NoTls;
use tracing::{info, warn};

/// Fatal startup errors, separate from the per-request [`crate::error::AppError`]
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to create connection pool: {0}")]
    PoolBuild(String),

    #[error("Database unreachable after {attempts} attempts: {last_error}")]
    ConnectionExhausted { attempts: u32, last_error: String },

    #[error("Schema initialization failed: {0}")]
    Schema(#[from] tokio_postgres::Error),

    #[error("Failed to get connection for schema initialization: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
}

/// Create a connection pool with given configuration
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool, InitError> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(config.max_pool_size));

    if config.require_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| InitError::PoolBuild(format!("Failed to create TLS pool: {}", e)))
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| InitError::PoolBuild(e.to_string()))
    }
}

/// Build the pool and wait until the database answers a query.
///
/// Tries `connect_retries` times with a fixed `retry_delay` between attempts.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<Pool, InitError> {
    let pool = create_pool(config)?;
    let attempts = config.connect_retries.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match verify_connection(&pool).await {
            Ok(()) => {
                info!(
                    "✅ Database connection successful on attempt {} (TLS: {})",
                    attempt, config.require_tls
                );
                return Ok(pool);
            }
            Err(e) => {
                last_error = e;
                warn!(
                    "⚠️  Database not ready (attempt {}/{}): {}",
                    attempt, attempts, last_error
                );
                if attempt < attempts {
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    Err(InitError::ConnectionExhausted {
        attempts,
        last_error,
    })
}

async fn verify_connection(pool: &Pool) -> Result<(), String> {
    let client = pool.get().await.map_err(|e| e.to_string())?;
    client
        .query_one(queries::PING, &[])
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Create (or, with `reset`, recreate) the proposals table and its indexes
pub async fn initialize_schema(pool: &Pool, reset: bool) -> Result<(), InitError> {
    let client = pool.get().await?;

    if reset {
        warn!("⚠️  Resetting bonus_proposals table");
        client.execute(queries::DROP_BONUS_PROPOSALS, &[]).await?;
    }

    client.execute(queries::CREATE_BONUS_PROPOSALS, &[]).await?;
    client.execute(queries::CREATE_MONTHLY_UNIQUE_INDEX, &[]).await?;
    client.execute(queries::CREATE_EMPLOYEE_DATE_INDEX, &[]).await?;

    info!("✅ Database tables initialized");
    Ok(())
}
