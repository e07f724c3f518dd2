//! Volley Client - query batching and parallel dispatch
//!
//! Callers queue read queries with result callbacks on a [`BatchClient`],
//! then fire one execution phase: every queued query is dispatched
//! concurrently over the client's owned connection pool, each callback is
//! invoked as its result arrives, and the batch call completes only once
//! every query has finished or failed.
//!
//! No ordering is guaranteed between the queries of one batch; they are
//! independent reads fanned out over distinct connections.

mod client;
mod dispatch;
mod pool;
mod queue;
pub mod runtime;
mod shape;

pub use client::BatchClient;
pub use queue::{QueryOptions, RowShape, ShapedResult};

/// Re-export commonly used types from volley-core
pub use volley_core::{
    ColumnMeta, ConnectConfig, Connection, DatabaseDriver, QueryResult, Result, Row,
    StatementResult, Value, VolleyError,
};
