/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `DATABASE_MIN_CONNECTIONS`: Connections kept open while idle (default: 1)
/// - `DATABASE_ACQUIRE_TIMEOUT`: Seconds a request waits for a connection before `503` (default: 5)
/// - `DATABASE_IDLE_TIMEOUT`: Seconds before surplus idle connections close, `0` to keep them (default: 300)
/// - `DATABASE_MAX_LIFETIME`: Seconds before a connection is recycled, `0` to never recycle (default: 1800)
/// - `DATABASE_RUN_MIGRATIONS`: Bootstrap the database on start (default: true)
/// - `JWT_SECRET`: Secret shared with the token issuer, at least 32 characters (required)
/// - `RUST_LOG`: Log filter (default: `hamayesh_api=debug,tower_http=debug`)
///
/// # Example
///
/// ```no_run
/// use hamayesh_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use hamayesh_shared::db::pool;
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any origin
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Connections kept open while idle
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    pub acquire_timeout_seconds: u64,

    /// Seconds before surplus idle connections close; `None` keeps them
    pub idle_timeout_seconds: Option<u64>,

    /// Seconds before a connection is recycled; `None` never recycles
    pub max_lifetime_seconds: Option<u64>,

    /// Create the database and apply migrations on startup
    pub run_migrations: bool,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key shared with the token issuer
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let defaults = pool::DatabaseConfig::default();
        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?;
        let min_connections = env_or("DATABASE_MIN_CONNECTIONS", defaults.min_connections)?;
        let acquire_timeout_seconds = env_or("DATABASE_ACQUIRE_TIMEOUT", defaults.acquire_timeout_seconds)?;
        let idle_timeout_seconds = optional_seconds(
            env_or("DATABASE_IDLE_TIMEOUT", defaults.idle_timeout_seconds.unwrap_or(0))?,
        );
        let max_lifetime_seconds = optional_seconds(
            env_or("DATABASE_MAX_LIFETIME", defaults.max_lifetime_seconds.unwrap_or(0))?,
        );
        if min_connections > max_connections {
            anyhow::bail!("DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS");
        }

        let run_migrations = env::var("DATABASE_RUN_MIGRATIONS")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                min_connections,
                acquire_timeout_seconds,
                idle_timeout_seconds,
                max_lifetime_seconds,
                run_migrations,
            },
            jwt: JwtConfig { secret: jwt_secret },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }

    /// Settings for the entity store pool
    pub fn pool_config(&self) -> pool::DatabaseConfig {
        pool::DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            acquire_timeout_seconds: self.database.acquire_timeout_seconds,
            idle_timeout_seconds: self.database.idle_timeout_seconds,
            max_lifetime_seconds: self.database.max_lifetime_seconds,
        }
    }
}

/// Reads and parses `key`, falling back to `default` when it is unset
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", key, e)),
        Err(_) => Ok(default),
    }
}

/// `0` disables a timeout
fn optional_seconds(seconds: u64) -> Option<u64> {
    (seconds > 0).then_some(seconds)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
