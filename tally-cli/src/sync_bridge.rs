use anyhow::{Context, Result};
use std::future::Future;

/// Run an async sync operation from synchronous code (the TUI event loop).
///
/// The CLI uses #[tokio::main], so we're often already inside a runtime.
/// Creating a nested runtime and calling block_on will panic.
///
/// Strategy:
/// - If a runtime is already running: use block_in_place + Handle::block_on
/// - Otherwise: create a runtime and block_on
pub fn block_on<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(fut))
    } else {
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        rt.block_on(fut)
    }
}
