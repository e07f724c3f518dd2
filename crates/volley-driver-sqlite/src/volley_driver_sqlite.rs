//! SQLite driver for the volley batched query client
//!
//! Implements the `volley-core` driver and connection traits over rusqlite.

mod connection;
mod driver;

pub use connection::SqliteConnection;
pub use driver::SqliteDriver;

#[cfg(test)]
mod tests {
    use super::*;
    use volley_core::{ConnectConfig, Connection, DatabaseDriver, Value};

    #[tokio::test]
    async fn test_sqlite_connection() {
        let conn = SqliteConnection::open(":memory:").expect("Failed to open in-memory db");

        conn.execute(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)",
            &[],
        )
        .await
        .expect("Failed to create table");

        conn.execute(
            "INSERT INTO users (name, email) VALUES ('Alice', 'alice@example.com')",
            &[],
        )
        .await
        .expect("Failed to insert");

        let result = conn
            .query("SELECT * FROM users", &[])
            .await
            .expect("Failed to query");

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.column_count(), 3);
        assert_eq!(
            result.rows[0].get_by_name("name").and_then(|v| v.as_str()),
            Some("Alice")
        );
    }

    #[tokio::test]
    async fn test_sqlite_bind_params() {
        let conn = SqliteConnection::open(":memory:").expect("Failed to open in-memory db");

        conn.execute("CREATE TABLE t (a INTEGER, b TEXT)", &[])
            .await
            .expect("Failed to create table");

        let result = conn
            .execute(
                "INSERT INTO t (a, b) VALUES (?, ?)",
                &[Value::Int64(7), Value::String("seven".into())],
            )
            .await
            .expect("Failed to insert");
        assert_eq!(result.affected_rows, 1);

        let rows = conn
            .query("SELECT b FROM t WHERE a = ?", &[Value::Int64(7)])
            .await
            .expect("Failed to query");
        assert_eq!(rows.rows.len(), 1);
        assert_eq!(rows.rows[0].get(0), Some(&Value::String("seven".into())));
    }

    #[tokio::test]
    async fn test_sqlite_invalid_sql_is_query_error() {
        let conn = SqliteConnection::open(":memory:").expect("Failed to open in-memory db");

        let err = conn
            .query("SELECT * FROM no_such_table", &[])
            .await
            .expect_err("query against a missing table should fail");
        assert!(err.to_string().contains("no_such_table"));
    }

    #[tokio::test]
    async fn test_sqlite_close_marks_connection_unusable() {
        let conn = SqliteConnection::open(":memory:").expect("Failed to open in-memory db");
        assert!(!conn.is_closed());

        conn.close().await.expect("close");
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_driver_connect_via_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("driver.db");
        let config = ConnectConfig::new_sqlite(path.to_str().expect("utf-8 path"));

        let driver = SqliteDriver::new();
        let conn = driver.connect(&config).await.expect("connect");
        assert_eq!(conn.driver_name(), "sqlite");

        driver
            .test_connection(&config)
            .await
            .expect("test_connection");
    }

    #[tokio::test]
    async fn test_driver_requires_path() {
        let driver = SqliteDriver::new();
        let config = ConnectConfig::new("sqlite");

        let err = driver
            .connect(&config)
            .await
            .expect_err("connect without a path should fail");
        assert!(err.to_string().contains("path"));
    }
}
