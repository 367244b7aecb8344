//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 8080,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_pool_size: usize,
    pub require_tls: bool,
    /// Startup connection attempts before giving up
    pub connect_retries: u32,
    /// Fixed delay between startup connection attempts
    pub retry_delay: Duration,
    /// Drop and recreate the proposals table on startup
    pub reset_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "bonuses".to_string(),
            max_pool_size: 10,
            require_tls: false,
            connect_retries: 5,
            retry_delay: Duration::from_secs(5),
            reset_schema: false,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Empty means any origin is allowed
    pub allowed_origins: Vec<String>,
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            host: parse_or(&lookup, "HOST", server_defaults.host)?,
            port: parse_or(&lookup, "PORT", server_defaults.port)?,
        };

        let db_defaults = DatabaseConfig::default();

        // DATABASE_URL wins over the individual DB_* variables
        let mut database = match lookup("DATABASE_URL") {
            Some(url) => Self::parse_database_url(&url)?,
            None => DatabaseConfig {
                host: lookup("DB_HOST").unwrap_or(db_defaults.host.clone()),
                port: parse_or(&lookup, "DB_PORT", db_defaults.port)?,
                user: lookup("DB_USER").unwrap_or(db_defaults.user.clone()),
                password: lookup("DB_PASSWORD").unwrap_or_default(),
                database: lookup("DB_NAME").unwrap_or(db_defaults.database.clone()),
                ..db_defaults.clone()
            },
        };

        database.max_pool_size = parse_or(&lookup, "DB_MAX_CONNECTIONS", db_defaults.max_pool_size)?;
        database.require_tls =
            database.require_tls || parse_or(&lookup, "DB_SSL_REQUIRE", db_defaults.require_tls)?;
        database.connect_retries =
            parse_or(&lookup, "DB_CONNECT_RETRIES", db_defaults.connect_retries)?.max(1);
        database.retry_delay = Duration::from_secs(parse_or(
            &lookup,
            "DB_RETRY_DELAY_SECS",
            db_defaults.retry_delay.as_secs(),
        )?);
        database.reset_schema = parse_or(&lookup, "DB_RESET_SCHEMA", db_defaults.reset_schema)?;

        let cors = CorsConfig {
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };

        Ok(Self {
            server,
            database,
            cors,
        })
    }

    /// Parse a DATABASE_URL connection string (postgresql://...)
    fn parse_database_url(url: &str) -> Result<DatabaseConfig, ConfigError> {
        let parsed = url::Url::parse(url).map_err(|_| {
            ConfigError::InvalidValue(
                "Invalid DATABASE_URL format (expected postgresql://...)".to_string(),
            )
        })?;

        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::InvalidValue(format!(
                "Unsupported DATABASE_URL scheme: {}",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidValue("Missing host in DATABASE_URL".to_string()))?
            .to_string();

        let database = parsed.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            return Err(ConfigError::InvalidValue(
                "Missing database name in DATABASE_URL".to_string(),
            ));
        }

        let require_tls = parsed
            .query_pairs()
            .any(|(k, v)| k == "sslmode" && v == "require");

        Ok(DatabaseConfig {
            host,
            port: parsed.port().unwrap_or(5432),
            user: parsed.username().to_string(),
            password: parsed.password().map(|p| p.to_string()).unwrap_or_default(),
            database,
            require_tls,
            ..DatabaseConfig::default()
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}
