//! Async runtime helpers for blocking callers.
//!
//! Actions execute on the interpreter's synchronous run loop, but process
//! spawning and timeouts use Tokio. This module provides the single bridge
//! between the two worlds, reusing the ambient runtime when one exists.

use anyhow::Context;
use std::future::Future;
use tokio::{runtime::Handle, task};

/// Run an async future to completion from synchronous code.
///
/// Reuses the current Tokio runtime when the caller is already inside one
/// (via `block_in_place`, so worker threads are not starved); otherwise spins
/// up a temporary single-threaded runtime for the duration of the call.
pub fn block_on_future<F, T>(future: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        task::block_in_place(|| handle.block_on(future))
    } else {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build a temporary async runtime")?
            .block_on(future)
    }
}

#[cfg(test)]
mod tests {
    use super::block_on_future;

    #[test]
    fn runs_future_without_ambient_runtime() {
        let value = block_on_future(async { Ok(41 + 1) }).expect("future completes");
        assert_eq!(value, 42);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reuses_ambient_runtime() {
        let value = tokio::task::spawn_blocking(|| block_on_future(async { Ok("ok") }))
            .await
            .expect("join")
            .expect("future completes");
        assert_eq!(value, "ok");
    }
}
