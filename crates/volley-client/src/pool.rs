//! Owned connection pool
//!
//! Connections belong to one client instance and are reused across its
//! batches. Within a batch the i-th descriptor runs on the i-th pooled
//! connection, so lending is purely index-based and needs no checkout
//! bookkeeping.

use std::sync::Arc;

use parking_lot::Mutex;
use volley_core::{ConnectConfig, Connection, DatabaseDriver, Result, VolleyError};

/// Pool of live connections, grown on demand and never shrunk below the
/// largest healthy batch it has served.
pub(crate) struct ConnectionPool {
    connections: Mutex<Vec<Arc<dyn Connection>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Number of live connections currently held
    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    /// Sizing pass before a dispatch: drop connections invalidated by an
    /// earlier error, then connect until at least `needed` are live.
    /// Returns clones of the first `needed` handles, index-aligned with the
    /// batch about to run.
    pub async fn ensure(
        &self,
        needed: usize,
        driver: &Arc<dyn DatabaseDriver>,
        config: &ConnectConfig,
    ) -> Result<Vec<Arc<dyn Connection>>> {
        let deficit = {
            let mut connections = self.connections.lock();
            let before = connections.len();
            connections.retain(|conn| !conn.is_closed());
            if connections.len() < before {
                tracing::debug!(
                    dropped = before - connections.len(),
                    "dropped invalidated connections from pool"
                );
            }
            needed.saturating_sub(connections.len())
        };

        // Connect outside the lock; the driver may block on I/O.
        let mut fresh = Vec::with_capacity(deficit);
        for _ in 0..deficit {
            let conn = driver.connect(config).await.map_err(|e| {
                VolleyError::Connection(format!(
                    "failed to grow connection pool via '{}' driver: {}",
                    driver.name(),
                    e
                ))
            })?;
            fresh.push(conn);
        }

        let mut connections = self.connections.lock();
        if !fresh.is_empty() {
            connections.extend(fresh);
            tracing::debug!(pool_size = connections.len(), "connection pool grown");
        }
        Ok(connections.iter().take(needed).cloned().collect())
    }
}
