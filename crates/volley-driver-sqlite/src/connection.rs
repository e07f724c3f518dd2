//! SQLite connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use volley_core::{
    ColumnMeta, Connection, QueryResult, Result, Row, StatementResult, Value, VolleyError,
};

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
    // The handle is shared; closing only marks it unusable so the owning
    // pool recycles it on its next sizing pass.
    closed: AtomicBool,
}

impl SqliteConnection {
    /// Open a SQLite database
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");
        let expanded_path = expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                VolleyError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent()
                    && !parent.exists()
                {
                    return Err(VolleyError::Connection(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                VolleyError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        // PRAGMA statements return results, so use pragma_update
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| VolleyError::Connection(format!("Failed to enable foreign keys: {}", e)))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| VolleyError::Connection(format!("Failed to set journal mode: {}", e)))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| VolleyError::Connection(format!("Failed to set synchronous mode: {}", e)))?;

        tracing::info!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            closed: AtomicBool::new(false),
        })
    }
}

/// Expand `~/` and relative paths; `:memory:` and `file:` URIs pass through.
fn expand_path(path: &str) -> Result<String> {
    if path == ":memory:" || path.starts_with("file:") {
        return Ok(path.to_string());
    }

    let expanded = if let Some(rest) = path.strip_prefix("~/") {
        match std::env::var_os("HOME") {
            Some(home) => std::path::PathBuf::from(home)
                .join(rest)
                .to_string_lossy()
                .to_string(),
            None => {
                return Err(VolleyError::Configuration(
                    "Unable to determine HOME directory".into(),
                ));
            }
        }
    } else if path.starts_with('~') {
        return Err(VolleyError::Configuration(
            "User-specific home directories (~user) are not supported".into(),
        ));
    } else {
        path.to_string()
    };

    let path_buf = std::path::PathBuf::from(&expanded);
    if path_buf.is_relative() {
        Ok(std::env::current_dir()
            .map_err(VolleyError::Io)?
            .join(path_buf)
            .to_string_lossy()
            .to_string())
    } else {
        Ok(expanded)
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let conn = self.conn.lock();
        let sqlite_params = values_to_sqlite(params);

        let rows_affected = conn
            .execute(sql, params_from_iter(sqlite_params.iter()))
            .map_err(|e| VolleyError::Query(format!("Failed to execute statement: {}", e)))?;

        tracing::debug!(affected_rows = rows_affected, "statement executed");
        Ok(StatementResult {
            affected_rows: rows_affected as u64,
        })
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let conn = self.conn.lock();
        let sqlite_params = values_to_sqlite(params);

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| VolleyError::Query(format!("Failed to prepare query: {}", e)))?;

        let mut column_names: Vec<String> = Vec::with_capacity(stmt.column_count());
        let mut columns: Vec<ColumnMeta> = Vec::with_capacity(stmt.column_count());
        for (idx, col) in stmt.columns().iter().enumerate() {
            let name = col.name().to_string();
            // Declared type from CREATE TABLE via sqlite3_column_decltype
            let data_type = col.decl_type().unwrap_or("DYNAMIC").to_string();
            column_names.push(name.clone());
            columns.push(ColumnMeta {
                name,
                data_type,
                ordinal: idx,
            });
        }

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query(params_from_iter(sqlite_params.iter()))
            .map_err(|e| VolleyError::Query(format!("Failed to execute query: {}", e)))?;

        while let Some(row) = query_rows
            .next()
            .map_err(|e| VolleyError::Query(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(sqlite_to_value(row, i)?);
            }
            rows.push(Row::new(column_names.clone(), values));
        }

        let mut result = QueryResult::new(columns, rows);
        result.execution_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::debug!(
            row_count = result.row_count(),
            execution_time_ms = result.execution_time_ms,
            "query executed successfully"
        );
        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing SQLite connection");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Convert our Value types to rusqlite-compatible types
fn values_to_sqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_sqlite).collect()
}

fn value_to_sqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
        Value::Json(j) => rusqlite::types::Value::Text(j.to_string()),
    }
}

/// Convert rusqlite row value to our Value type
fn sqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| VolleyError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => {
            // SQLite BLOBs might actually contain text stored in columns
            // without an explicit type; try UTF-8 first
            match std::str::from_utf8(b) {
                Ok(s) => Value::String(s.to_string()),
                Err(_) => Value::Bytes(b.to_vec()),
            }
        }
    };

    Ok(value)
}
