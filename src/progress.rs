//! Progress-callback trait for per-task conversion events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive
//! real-time events as the dispatcher drives each task.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a broadcast channel, a WebSocket, or a terminal progress
//! bar without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so it works correctly when tasks
//! complete concurrently and out of order.

use std::path::Path;
use std::sync::Arc;

/// Called by the dispatcher as it drives each conversion task.
///
/// Implementations must be `Send + Sync` (tasks run concurrently). All
/// methods have default no-op implementations so callers only override what
/// they care about.
///
/// # Thread safety
///
/// `on_task_start`, `on_task_complete`, and `on_task_error` may be called
/// concurrently from different tasks. Implementations must protect shared
/// mutable state (`Mutex`, `AtomicUsize`, …).
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after discovery, before any task is dispatched.
    fn on_run_start(&self, total_tasks: usize) {
        let _ = total_tasks;
    }

    /// Called when a task acquires a dispatch slot.
    fn on_task_start(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called when a task's conversion succeeded and the output is on disk.
    fn on_task_complete(&self, index: usize, total: usize, output: &Path) {
        let _ = (index, total, output);
    }

    /// Called when a task terminated as failed.
    fn on_task_error(&self, index: usize, total: usize, error: String) {
        let _ = (index, total, error);
    }

    /// Called once after the barrier wait, when every task has finished.
    fn on_run_complete(&self, total_tasks: usize, succeeded: usize) {
        let _ = (total_tasks, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
