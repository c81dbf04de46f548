//! Streaming run API: emit task outcomes as they complete.
//!
//! ## Why stream?
//!
//! Large batches take minutes. A stream-based API lets callers report each
//! file the moment it finishes, wire up progress bars, or stop consuming
//! early, instead of waiting behind the barrier that [`crate::dispatch::run`]
//! imposes before its aggregate report.
//!
//! Outcomes arrive in completion order, not task order (sort by
//! [`crate::report::TaskOutcome::index`] if order matters). Each item is a
//! full [`TaskOutcome`] — failures are embedded, never surfaced as stream
//! errors, so one bad file cannot terminate the stream.

use crate::config::RunConfig;
use crate::dispatch;
use crate::error::RelayError;
use crate::pipeline::client::{self, ConversionClient};
use crate::report::TaskOutcome;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of task outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = TaskOutcome> + Send>>;

/// Convert every matching file, yielding each outcome as its task finishes.
///
/// # Returns
/// - `Ok(OutcomeStream)` — drains in completion order; at most
///   `config.concurrency` tasks are in flight while it is polled
/// - `Err(RelayError)` — fatal error (discovery failed, bad configuration)
pub fn run_stream(config: &RunConfig) -> Result<OutcomeStream, RelayError> {
    let client = client::client_for(config)?;
    run_stream_with_client(config, client)
}

/// [`run_stream`] with an injected [`ConversionClient`].
pub fn run_stream_with_client(
    config: &RunConfig,
    client: Arc<dyn ConversionClient>,
) -> Result<OutcomeStream, RelayError> {
    let tasks = dispatch::prepare_tasks(config)?;
    let total = tasks.len();
    info!("streaming run over {total} tasks");
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let concurrency = config.concurrency;
    let config = config.clone();
    let s = stream::iter(tasks.into_iter().map(move |task| {
        let client = Arc::clone(&client);
        let config = config.clone();
        async move { dispatch::execute_task(task, client, &config, total).await }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
