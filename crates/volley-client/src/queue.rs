//! Query queue and descriptors

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use volley_core::{Connection, Value};

/// How raw result rows are reshaped before the response callback sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowShape {
    /// First matching row as a column→value map
    FirstRow,
    /// Selected columns of every row, flattened into one list
    Column,
    /// Every row keyed by a designated column's rendered value
    KeyedRows,
    /// Every row as a plain list of values
    Rows,
}

/// Result of applying a [`RowShape`] to a raw query result.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedResult {
    /// `None` when the result set was empty
    FirstRow(Option<HashMap<String, Value>>),
    Column(Vec<Value>),
    KeyedRows(HashMap<String, HashMap<String, Value>>),
    Rows(Vec<Vec<Value>>),
}

/// Per-query options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    /// 0-based indices of the columns [`RowShape::Column`] extracts.
    /// Every selected column, in row-major order, when unset.
    pub columns: Option<Vec<usize>>,
}

impl QueryOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict column extraction to the given 0-based indices
    pub fn with_columns(mut self, columns: Vec<usize>) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// Response callback invoked with the shaped result and the connection the
/// query ran on.
pub(crate) type ResponseFn = Box<dyn FnOnce(ShapedResult, Arc<dyn Connection>) + Send + 'static>;

/// One deferred query captured by an enqueue call.
///
/// Immutable once queued; consumed exactly once when the dispatcher fires it.
pub(crate) struct QueuedQuery {
    pub sql: String,
    pub shape: RowShape,
    pub key_field: Option<String>,
    pub params: Vec<Value>,
    pub options: QueryOptions,
    pub response: ResponseFn,
}

/// Insertion-ordered buffer of deferred queries, accumulated between batch
/// executions.
#[derive(Default)]
pub(crate) struct QueryQueue {
    entries: Vec<QueuedQuery>,
}

impl QueryQueue {
    /// Append a descriptor; call order is queue order
    pub fn push(&mut self, query: QueuedQuery) {
        self.entries.push(query);
    }

    /// Take the whole queue, leaving it empty
    pub fn drain(&mut self) -> Vec<QueuedQuery> {
        std::mem::take(&mut self.entries)
    }

    /// Discard all pending descriptors, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
