//! Eager (full-run) entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: wait for every task, then return a
//! [`RunReport`]. It collects every [`TaskOutcome`] into memory and computes
//! the aggregate statistics after the barrier wait. Use
//! [`crate::stream::run_stream`] instead when you want outcomes as they
//! complete.
//!
//! Concurrency is a bounded worker pool: tasks enter flight through
//! `buffer_unordered(concurrency)`, so at most N conversions hold a slot at
//! any instant, a finishing task frees its slot regardless of outcome, and
//! one task's failure never aborts or blocks its siblings. There are no
//! retries and no cancellation; a dispatched task runs to its terminal
//! state.

use crate::config::RunConfig;
use crate::error::{ArchiveError, RelayError, TaskError};
use crate::mapping;
use crate::pipeline::client::{self, ConversionClient};
use crate::pipeline::{archive, discover, resolve};
use crate::report::{ConversionTask, RunReport, RunStats, TaskOutcome};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Convert every matching file under the configured scan root.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(RunReport)` on a completed run, even if some (or all) tasks failed —
/// check `report.stats`. Zero discovered files is a valid empty run.
///
/// # Errors
/// Returns `Err(RelayError)` only for fatal errors: the directory walk
/// failed, or the HTTP client could not be constructed.
pub async fn run(config: &RunConfig) -> Result<RunReport, RelayError> {
    let client = client::client_for(config)?;
    run_with_client(config, client).await
}

/// [`run`] with an injected [`ConversionClient`].
///
/// The seam exists for callers that wrap the client (caching, middleware)
/// and for tests, which inject a deterministic client and a concurrency
/// limit of 1 to assert full ordering — or count in-flight calls to assert
/// the N-slot invariant directly.
pub async fn run_with_client(
    config: &RunConfig,
    client: Arc<dyn ConversionClient>,
) -> Result<RunReport, RelayError> {
    let total_start = Instant::now();

    let tasks = prepare_tasks(config)?;
    if tasks.is_empty() {
        info!(
            "no files matching {:?} under {}",
            config.extensions,
            config.root.display()
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_run_complete(0, 0);
        }
        return Ok(RunReport {
            outcomes: Vec::new(),
            stats: RunStats::from_outcomes(&[], total_start.elapsed()),
        });
    }

    info!(
        "found {} files to convert under {} ({:?})",
        tasks.len(),
        config.root.display(),
        config.extensions
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(tasks.len());
    }

    let total = tasks.len();
    let mut outcomes: Vec<TaskOutcome> = stream::iter(tasks.into_iter().map(|task| {
        let client = Arc::clone(&client);
        let config = config.clone();
        async move { execute_task(task, client, &config, total).await }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Completion order is arbitrary under concurrency; report in task order.
    outcomes.sort_by_key(|o| o.index);

    let stats = RunStats::from_outcomes(&outcomes, total_start.elapsed());
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(stats.attempted, stats.succeeded);
    }
    info!(
        "run complete: {}/{} succeeded in {}ms",
        stats.succeeded, stats.attempted, stats.total_duration_ms
    );

    Ok(RunReport { outcomes, stats })
}

/// Discover files and pair each with its resolved target format.
pub(crate) fn prepare_tasks(config: &RunConfig) -> Result<Vec<ConversionTask>, RelayError> {
    let files = discover::discover_files(&config.root, &config.extensions)?;
    Ok(files
        .into_iter()
        .enumerate()
        .map(|(index, source)| {
            let source_type = discover::source_type(&source);
            let target_type =
                mapping::resolve_target(&source_type, config.target_override.as_deref());
            ConversionTask {
                index,
                source,
                source_type,
                target_type,
            }
        })
        .collect())
}

/// Drive one task to its terminal state and record the outcome.
///
/// Never returns an error: per-task failures are contained in the
/// [`TaskOutcome`] so a bad file cannot abort its siblings.
pub(crate) async fn execute_task(
    task: ConversionTask,
    client: Arc<dyn ConversionClient>,
    config: &RunConfig,
    total: usize,
) -> TaskOutcome {
    let start = Instant::now();
    info!(
        "[task {}] converting {} -> {}",
        task.index,
        task.source.display(),
        task.target_type
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_task_start(task.index, total, &task.source);
    }

    let mut outcome = TaskOutcome {
        index: task.index,
        source: task.source.clone(),
        source_type: task.source_type.clone(),
        target_type: task.target_type.clone(),
        output: None,
        archived_to: None,
        duration_ms: 0,
        error: None,
        archive_error: None,
    };

    match convert_one(&task, client.as_ref(), config).await {
        Ok(done) => {
            outcome.output = Some(done.output);
            outcome.archived_to = done.archived_to;
            outcome.archive_error = done.archive_error;
        }
        Err(e) => outcome.error = Some(e),
    }
    outcome.duration_ms = start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        match (&outcome.error, &outcome.output) {
            (None, Some(output)) => cb.on_task_complete(task.index, total, output),
            (Some(e), _) => cb.on_task_error(task.index, total, e.to_string()),
            _ => {}
        }
    }
    match &outcome.error {
        None => info!(
            "[task {}] done in {}ms: {}",
            task.index,
            outcome.duration_ms,
            outcome.output.as_deref().unwrap_or(Path::new("?")).display()
        ),
        Some(e) => warn!(
            "[task {}] {} failed at {} stage: {e}",
            task.index,
            task.source.display(),
            e.stage()
        ),
    }
    outcome
}

struct TaskSuccess {
    output: PathBuf,
    archived_to: Option<PathBuf>,
    archive_error: Option<ArchiveError>,
}

/// The task body: read → request → resolve → write → archive.
///
/// The first error terminates the task; writing happens last so a failed
/// task leaves nothing on disk.
async fn convert_one(
    task: &ConversionTask,
    client: &dyn ConversionClient,
    config: &RunConfig,
) -> Result<TaskSuccess, TaskError> {
    let content = tokio::fs::read(&task.source)
        .await
        .map_err(|e| TaskError::Read {
            path: task.source.clone(),
            detail: e.to_string(),
        })?;

    let converted = client
        .convert(&content, &task.source_type, &task.target_type)
        .await?;

    let output = resolve::resolve_output(
        &task.source,
        &task.target_type,
        &config.root,
        config.output_root.as_deref(),
    )?;
    write_output(&output, &converted.bytes).await?;

    // With an explicit output root the original stays where it is.
    let (archived_to, archive_error) = if config.output_root.is_none() {
        match archive::archive_original(&task.source, &config.root, &config.backup_root).await {
            Ok(dest) => (Some(dest), None),
            Err(e) => {
                warn!("[task {}] archive of {} failed: {e}", task.index, task.source.display());
                (None, Some(e))
            }
        }
    } else {
        (None, None)
    };

    Ok(TaskSuccess {
        output,
        archived_to,
        archive_error,
    })
}

/// Write via temp-then-rename so a failed task never leaves partial output.
async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), TaskError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.part"));

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(TaskError::Write {
            path: path.to_path_buf(),
            detail: e.to_string(),
        });
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(TaskError::Write {
            path: path.to_path_buf(),
            detail: e.to_string(),
        });
    }
    Ok(())
}
