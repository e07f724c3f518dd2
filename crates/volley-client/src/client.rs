//! Batching client
//!
//! [`BatchClient`] accumulates read queries with typed result callbacks and
//! executes them as one concurrent batch over an owned connection pool.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use volley_core::{ConnectConfig, Connection, DatabaseDriver, Result, Value};

use crate::dispatch::dispatch;
use crate::pool::ConnectionPool;
use crate::queue::{QueryOptions, QueryQueue, QueuedQuery, RowShape, ShapedResult};

/// Client that batches read queries and fans them out concurrently.
///
/// Enqueue operations only record work; nothing touches the database until
/// [`execute_batch`](BatchClient::execute_batch) runs. The pool of
/// connections grows to cover the largest batch seen and is reused across
/// batches for the lifetime of the client.
pub struct BatchClient {
    driver: Arc<dyn DatabaseDriver>,
    config: ConnectConfig,
    queue: Mutex<QueryQueue>,
    pool: ConnectionPool,
}

impl BatchClient {
    /// Create a client from a driver and the connect parameters every pooled
    /// connection will be created with.
    pub fn new(driver: Arc<dyn DatabaseDriver>, config: ConnectConfig) -> Self {
        tracing::debug!(driver = driver.name(), "batch client created");
        Self {
            driver,
            config,
            queue: Mutex::new(QueryQueue::default()),
            pool: ConnectionPool::new(),
        }
    }

    /// Queue a query whose callback receives the first matching row as a
    /// column→value map, or `None` when the result set is empty.
    pub fn queue_first_row<F>(
        &self,
        sql: impl Into<String>,
        options: QueryOptions,
        params: Vec<Value>,
        response: F,
    ) where
        F: FnOnce(Option<HashMap<String, Value>>, Arc<dyn Connection>) + Send + 'static,
    {
        self.push(QueuedQuery {
            sql: sql.into(),
            shape: RowShape::FirstRow,
            key_field: None,
            params,
            options,
            response: Box::new(move |shaped, conn| match shaped {
                ShapedResult::FirstRow(row) => response(row, conn),
                _ => unreachable!("first-row query shaped into a different variant"),
            }),
        });
    }

    /// Queue a query whose callback receives the selected columns of every
    /// row flattened into one list.
    ///
    /// By default every column is taken in row-major order; restrict with
    /// [`QueryOptions::with_columns`].
    pub fn queue_column<F>(
        &self,
        sql: impl Into<String>,
        options: QueryOptions,
        params: Vec<Value>,
        response: F,
    ) where
        F: FnOnce(Vec<Value>, Arc<dyn Connection>) + Send + 'static,
    {
        self.push(QueuedQuery {
            sql: sql.into(),
            shape: RowShape::Column,
            key_field: None,
            params,
            options,
            response: Box::new(move |shaped, conn| match shaped {
                ShapedResult::Column(values) => response(values, conn),
                _ => unreachable!("column query shaped into a different variant"),
            }),
        });
    }

    /// Queue a query whose callback receives every row keyed by the rendered
    /// value of `key_field`.
    ///
    /// The key field must be one of the selected columns; a key field absent
    /// from the result set fails the batch with a usage error.
    pub fn queue_keyed_rows<F>(
        &self,
        sql: impl Into<String>,
        key_field: &str,
        options: QueryOptions,
        params: Vec<Value>,
        response: F,
    ) where
        F: FnOnce(HashMap<String, HashMap<String, Value>>, Arc<dyn Connection>) + Send + 'static,
    {
        self.push(QueuedQuery {
            sql: sql.into(),
            shape: RowShape::KeyedRows,
            key_field: Some(key_field.to_string()),
            params,
            options,
            response: Box::new(move |shaped, conn| match shaped {
                ShapedResult::KeyedRows(keyed) => response(keyed, conn),
                _ => unreachable!("keyed-rows query shaped into a different variant"),
            }),
        });
    }

    /// Queue a query whose callback receives every row as a list of values.
    pub fn queue_rows<F>(
        &self,
        sql: impl Into<String>,
        options: QueryOptions,
        params: Vec<Value>,
        response: F,
    ) where
        F: FnOnce(Vec<Vec<Value>>, Arc<dyn Connection>) + Send + 'static,
    {
        self.push(QueuedQuery {
            sql: sql.into(),
            shape: RowShape::Rows,
            key_field: None,
            params,
            options,
            response: Box::new(move |shaped, conn| match shaped {
                ShapedResult::Rows(rows) => response(rows, conn),
                _ => unreachable!("rows query shaped into a different variant"),
            }),
        });
    }

    fn push(&self, query: QueuedQuery) {
        let shape = query.shape;
        let mut queue = self.queue.lock();
        queue.push(query);
        tracing::debug!(queued = queue.len(), shape = ?shape, "query queued");
    }

    /// Number of queries waiting for the next batch
    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Number of live pooled connections
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Execute every queued query concurrently and wait for all of them.
    ///
    /// The queue is snapshotted and emptied up front, so it is empty once
    /// this returns regardless of outcome. An empty queue is a no-op that
    /// creates no connections. On the success path every callback has fired
    /// exactly once, in driver-completion order. A connection failure while
    /// sizing the pool abandons the batch without running anything; a query
    /// failure aborts the wait while detached siblings keep running.
    ///
    /// No per-query timeout is applied: a query that never completes stalls
    /// the whole batch.
    pub async fn execute_batch(&self) -> Result<()> {
        let batch = self.queue.lock().drain();
        if batch.is_empty() {
            return Ok(());
        }
        tracing::debug!(queries = batch.len(), "executing batch");

        let connections = match self.pool.ensure(batch.len(), &self.driver, &self.config).await {
            Ok(connections) => connections,
            Err(e) => {
                // Teardown per the connection-error policy: nothing pending
                // survives, including enqueues that raced the sizing pass.
                let dropped = self.queue.lock().clear();
                tracing::error!(
                    error = %e,
                    abandoned = batch.len() + dropped,
                    "connection failure, abandoning batch"
                );
                return Err(e);
            }
        };

        dispatch(batch, &connections).await
    }

    /// Discard all pending queries without executing them or invoking their
    /// callbacks. Idempotent; has no effect on already-dispatched work.
    pub fn cancel_queue(&self) {
        let dropped = self.queue.lock().clear();
        if dropped > 0 {
            tracing::debug!(dropped, "pending queue cancelled");
        }
    }

    /// Obtain one live connection directly, bypassing the queue.
    ///
    /// Ensures the pool holds at least one connection and returns the first.
    /// Useful for schema setup or other direct driver access.
    pub async fn raw_connection(&self) -> Result<Arc<dyn Connection>> {
        match self.pool.ensure(1, &self.driver, &self.config).await {
            Ok(mut connections) => Ok(connections.swap_remove(0)),
            Err(e) => {
                let dropped = self.queue.lock().clear();
                if dropped > 0 {
                    tracing::error!(error = %e, dropped, "connection failure, pending queue cleared");
                }
                Err(e)
            }
        }
    }

    /// Blocking form of [`execute_batch`](BatchClient::execute_batch) for
    /// callers outside an async runtime.
    pub fn execute_batch_blocking(&self) -> Result<()> {
        crate::runtime::block_on(self.execute_batch())
    }

    /// Blocking form of [`raw_connection`](BatchClient::raw_connection).
    pub fn raw_connection_blocking(&self) -> Result<Arc<dyn Connection>> {
        crate::runtime::block_on(self.raw_connection())
    }
}
