//! Shared Tokio runtime for synchronous callers
//!
//! The batching entry points are async; callers that are not already inside
//! an async runtime (CLI tools, test harnesses, plain threads) go through
//! this shared runtime via the `*_blocking` client methods.

use std::sync::OnceLock;
use tokio::runtime::Runtime;

/// Global Tokio runtime for blocking batch execution
static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or create the shared Tokio runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be created.
fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("volley-runtime")
            .build()
            .expect("Failed to create Tokio runtime for batched queries")
    })
}

/// Run a batching future to completion, blocking the current thread.
///
/// Must not be called from inside an async runtime; use the async client
/// methods there instead.
pub fn block_on<F, T>(future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    runtime().block_on(future)
}
