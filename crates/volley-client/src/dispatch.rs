//! Batch dispatcher
//!
//! The fan-out/fan-in core: every descriptor of a batch is spawned before
//! any is awaited, runs on its own pooled connection, and invokes its
//! callback the moment its result arrives.

use std::sync::Arc;

use volley_core::{Connection, Result, VolleyError};

use crate::queue::QueuedQuery;
use crate::shape::shape_result;

/// Fire the whole batch concurrently over its index-aligned connections and
/// wait for every query to finish.
///
/// The first failure closes the connection it ran on and aborts the wait;
/// sibling tasks keep running detached rather than being cancelled, so after
/// an error some subset of callbacks may still fire or may never fire.
pub(crate) async fn dispatch(
    batch: Vec<QueuedQuery>,
    connections: &[Arc<dyn Connection>],
) -> Result<()> {
    debug_assert!(connections.len() >= batch.len());
    tracing::debug!(queries = batch.len(), "dispatching batch");

    let mut handles = Vec::with_capacity(batch.len());
    for (index, query) in batch.into_iter().enumerate() {
        let conn = Arc::clone(&connections[index]);
        handles.push(tokio::spawn(run_query(index, query, conn)));
    }

    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            // Covers a panicking response callback as well
            Err(e) => {
                return Err(VolleyError::Query(format!(
                    "batched query task failed: {}",
                    e
                )));
            }
        }
    }

    tracing::debug!("batch complete");
    Ok(())
}

async fn run_query(index: usize, query: QueuedQuery, conn: Arc<dyn Connection>) -> Result<()> {
    let result = match conn.query(&query.sql, &query.params).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(index, error = %e, "batched query failed, invalidating its connection");
            let _ = conn.close().await;
            return Err(e);
        }
    };

    let shaped = shape_result(&query, result)?;
    (query.response)(shaped, conn);
    Ok(())
}
