//! Global Tokio runtime for backend requests and speech playback
//!
//! GPUI uses its own async executor, but reqwest requires a Tokio runtime.
//! This module provides a lazy-initialized global Tokio runtime whose tasks
//! are awaited from GPUI tasks.

use gpui::{App, Context, Task};
use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Handle, Runtime};

static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Initialize the global Tokio runtime. Call this during app startup.
pub fn init(_cx: &mut App) -> std::io::Result<()> {
    if TOKIO_RUNTIME.get().is_some() {
        return Ok(());
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("scrumbot-io")
        .enable_all()
        .build()?;
    let _ = TOKIO_RUNTIME.set(runtime);
    Ok(())
}

/// Get the global Tokio runtime handle
fn handle() -> Handle {
    TOKIO_RUNTIME
        .get()
        .expect("Tokio runtime not initialized - call tokio_runtime::init() first")
        .handle()
        .clone()
}

/// Spawn a future on the Tokio runtime and return a GPUI Task
pub fn spawn<T, R, F>(cx: &mut Context<T>, future: F) -> Task<Result<R, tokio::task::JoinError>>
where
    R: Send + 'static,
    F: Future<Output = R> + Send + 'static,
{
    let join_handle = handle().spawn(future);

    cx.foreground_executor().spawn(join_handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "Tokio runtime not initialized")]
    fn test_handle_requires_init() {
        let _ = handle();
    }
}
