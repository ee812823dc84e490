//! # Database Pool Configuration
//!
//! Builds the `SqlitePool` handed to every CRUD call.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::from_env() / DbConfig::new(path) / DbConfig::in_memory()     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  connect(&config).await ← Create pool                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                            │
//! │  │            SqlitePool                   │                            │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐        │                            │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...    │  (max_connections)         │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘        │                            │
//! │  └─────────────────────────────────────────┘                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  wrap(&mut model).find(&pool).await                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CRUD layer never opens or closes connections; it borrows whatever
//! pool the caller passes in.
//!
//! ## Environment
//! | Variable                       | Default      |
//! |--------------------------------|--------------|
//! | `EZREPO_DB_PATH`               | `ezrepo.db`  |
//! | `EZREPO_MAX_CONNECTIONS`       | `5`          |
//! | `EZREPO_MIN_CONNECTIONS`       | `1`          |
//! | `EZREPO_CONNECT_TIMEOUT_SECS`  | `30`         |
//!
//! `EZREPO_DB_PATH=:memory:` selects an in-memory database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ConfigError, DbError, DbResult};

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/blog.db")
///     .max_connections(5)
///     .min_connections(1);
/// let pool = connect(&config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Every pool built from it gets its own private database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    /// Loads configuration from environment variables with fallback to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup("EZREPO_DB_PATH").unwrap_or_else(|| "ezrepo.db".to_string());
        let base = if path == IN_MEMORY {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path)
        };

        let parse = |key: &str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string())),
                None => Ok(default),
            }
        };

        let max_connections = parse("EZREPO_MAX_CONNECTIONS", base.max_connections.into())?;
        let min_connections = parse("EZREPO_MIN_CONNECTIONS", base.min_connections.into())?;
        let timeout_secs = parse("EZREPO_CONNECT_TIMEOUT_SECS", base.connect_timeout.as_secs())?;

        let max_connections = u32::try_from(max_connections)
            .map_err(|_| ConfigError::InvalidValue("EZREPO_MAX_CONNECTIONS".to_string()))?;
        let min_connections = u32::try_from(min_connections)
            .map_err(|_| ConfigError::InvalidValue("EZREPO_MIN_CONNECTIONS".to_string()))?;

        if max_connections == 0 {
            return Err(ConfigError::InvalidValue("EZREPO_MAX_CONNECTIONS".to_string()));
        }
        if min_connections > max_connections {
            return Err(ConfigError::InvalidValue("EZREPO_MIN_CONNECTIONS".to_string()));
        }

        Ok(base
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(timeout_secs)))
    }
}

// =============================================================================
// Pool
// =============================================================================

/// Creates a connection pool for `config`.
///
/// ## What This Does
/// 1. Creates the database file if it doesn't exist
/// 2. Configures SQLite:
///    - WAL mode and NORMAL synchronous for file databases
///    - Foreign keys enabled
/// 3. Creates the connection pool
///
/// In-memory databases are pinned to a single connection that never expires,
/// so the data lives as long as the pool.
pub async fn connect(config: &DbConfig) -> DbResult<SqlitePool> {
    info!(
        path = %config.database_path.display(),
        "Initializing database connection"
    );

    let (connect_options, pool_options) = if config.is_in_memory() {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        (options, pool)
    } else {
        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(Some(config.idle_timeout));
        (options, pool)
    };

    debug!("Connection options configured");

    let pool = pool_options
        .acquire_timeout(config.connect_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

    info!(
        max_connections = pool.options().get_max_connections(),
        "Database pool created"
    );

    Ok(pool)
}

/// Checks if the database can execute queries.
pub async fn health_check(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
