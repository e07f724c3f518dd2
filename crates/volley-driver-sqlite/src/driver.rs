//! SQLite driver implementation

use async_trait::async_trait;
use std::sync::Arc;
use volley_core::{ConnectConfig, Connection, DatabaseDriver, Result, VolleyError};

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").or_else(|| config.get_string("database")).as_deref()))]
    async fn connect(&self, config: &ConnectConfig) -> Result<Arc<dyn Connection>> {
        let path = config
            .get_string("path")
            .or_else(|| config.get_string("database"))
            .ok_or_else(|| {
                VolleyError::Configuration(
                    "SQLite requires a 'path' or 'database' parameter. Use :memory: for an in-memory database".into(),
                )
            })?;

        let conn = SqliteConnection::open(&path).map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            VolleyError::Connection(format!("Failed to connect to SQLite database: {}", e))
        })?;

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }

    fn build_connection_string(&self, config: &ConnectConfig) -> String {
        config
            .get_string("path")
            .or_else(|| config.get_string("database"))
            .unwrap_or_else(|| ":memory:".to_string())
    }
}
