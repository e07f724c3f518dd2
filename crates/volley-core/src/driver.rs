//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier for this driver (e.g., "sqlite", "postgres")
    fn name(&self) -> &'static str;

    /// Create a new connection
    async fn connect(&self, config: &ConnectConfig) -> Result<Arc<dyn Connection>>;

    /// Test that the configuration yields a usable connection, without
    /// keeping it
    async fn test_connection(&self, config: &ConnectConfig) -> Result<()> {
        tracing::debug!(driver = self.name(), "testing connection");
        let conn = self.connect(config).await?;
        conn.query("SELECT 1", &[]).await?;
        conn.close().await
    }

    /// Build a connection string from configuration
    fn build_connection_string(&self, config: &ConnectConfig) -> String;
}

/// Connect parameters supplied at client construction and reused for every
/// pool growth connect.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Driver ID (e.g., "sqlite", "postgres")
    pub driver: String,
    /// Host address (empty for file-based databases)
    pub host: String,
    /// Port number (0 for default or file-based)
    pub port: u16,
    /// Database name or file path
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            host: String::new(),
            port: 0,
            database: None,
            username: None,
            password: None,
            params: HashMap::new(),
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite");
        config.database = Some(database_path.to_string());
        config
    }

    /// Set the host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the credentials
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let val = value.into();
        let str_val = match val {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        self.params.insert(key.to_string(), str_val);
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        // First check params
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        // Check known fields
        match key {
            "host" => Some(self.host.clone()),
            "database" | "path" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }

    /// Get port
    pub fn get_port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_field_lookup() {
        let config = ConnectConfig::new("postgres")
            .with_host("db.example.com")
            .with_port(5432)
            .with_credentials("reader", "secret");

        assert_eq!(config.get_string("host").as_deref(), Some("db.example.com"));
        assert_eq!(config.get_string("user").as_deref(), Some("reader"));
        assert_eq!(config.get_string("password").as_deref(), Some("secret"));
        assert_eq!(config.get_port(), 5432);
        assert_eq!(config.get_string("unknown"), None);
    }

    #[test]
    fn test_config_params_take_precedence_over_fields() {
        let config =
            ConnectConfig::new_sqlite("/tmp/data.db").with_param("path", "/tmp/override.db");

        assert_eq!(
            config.get_string("path").as_deref(),
            Some("/tmp/override.db")
        );
        assert_eq!(config.get_string("database").as_deref(), Some("/tmp/data.db"));
    }

    #[test]
    fn test_config_param_values_are_stringified() {
        let config = ConnectConfig::new("mock")
            .with_param("timeout_ms", 250)
            .with_param("mode", "ro");

        assert_eq!(config.get_string("timeout_ms").as_deref(), Some("250"));
        assert_eq!(config.get_string("mode").as_deref(), Some("ro"));
    }
}
