//! Per-task and aggregate result types.
//!
//! A run produces one [`TaskOutcome`] per discovered file plus a single
//! [`RunStats`] summary. Everything here serialises to JSON so the CLI's
//! `--json` mode and downstream tooling get a structured record of the run.

use crate::error::{ArchiveError, TaskError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One scheduled unit of work: a single source file to convert.
///
/// Created once per discovered file, immutable, consumed by exactly one
/// worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionTask {
    /// Position in discovery order; used to correlate log lines.
    pub index: usize,
    /// Absolute or root-relative path of the source file.
    pub source: PathBuf,
    /// Source extension without the dot (`doc`, `wps`, …).
    pub source_type: String,
    /// Resolved target format (`docx`, `pdf`, …).
    pub target_type: String,
}

/// What happened to one task.
///
/// `error == None` means the conversion succeeded and `output` names the
/// written file. An archive failure is recorded separately and does not
/// flip a success into a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub index: usize,
    pub source: PathBuf,
    pub source_type: String,
    pub target_type: String,
    /// Where the converted output landed; `None` when the task failed.
    pub output: Option<PathBuf>,
    /// Where the original was moved; `None` when archival was skipped
    /// (explicit output root) or failed.
    pub archived_to: Option<PathBuf>,
    /// Wall-clock time from task start to terminal state.
    pub duration_ms: u64,
    /// The failure that terminated the task, if any.
    pub error: Option<TaskError>,
    /// Archive-stage failure; the conversion itself still counts as a
    /// success when this is set.
    pub archive_error: Option<ArchiveError>,
}

impl TaskOutcome {
    /// Whether the conversion (not necessarily the archival) succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics over one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Tasks scheduled (files discovered).
    pub attempted: usize,
    /// Tasks whose conversion succeeded.
    pub succeeded: usize,
    /// Tasks that terminated with a [`TaskError`].
    pub failed: usize,
    /// Wall-clock time for the whole run.
    pub total_duration_ms: u64,
    /// Mean per-file duration over *successful* tasks only; `None` when
    /// nothing succeeded.
    pub avg_success_ms: Option<u64>,
}

impl RunStats {
    /// Aggregate outcomes into summary statistics.
    pub fn from_outcomes(outcomes: &[TaskOutcome], total_duration: Duration) -> Self {
        let attempted = outcomes.len();
        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        let success_ms: u64 = outcomes
            .iter()
            .filter(|o| o.succeeded())
            .map(|o| o.duration_ms)
            .sum();
        Self {
            attempted,
            succeeded,
            failed: attempted - succeeded,
            total_duration_ms: total_duration.as_millis() as u64,
            avg_success_ms: (succeeded > 0).then(|| success_ms / succeeded as u64),
        }
    }
}

/// The full result of a run: every outcome plus the aggregate summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-task outcomes, sorted by task index.
    pub outcomes: Vec<TaskOutcome>,
    pub stats: RunStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, duration_ms: u64, error: Option<TaskError>) -> TaskOutcome {
        TaskOutcome {
            index,
            source: PathBuf::from(format!("f{index}.doc")),
            source_type: "doc".into(),
            target_type: "docx".into(),
            output: error.is_none().then(|| PathBuf::from(format!("f{index}.docx"))),
            archived_to: None,
            duration_ms,
            error,
            archive_error: None,
        }
    }

    #[test]
    fn stats_count_successes_and_failures() {
        let outcomes = vec![
            outcome(0, 100, None),
            outcome(1, 300, None),
            outcome(2, 50, Some(TaskError::Status { status: 500 })),
        ];
        let stats = RunStats::from_outcomes(&outcomes, Duration::from_millis(400));
        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_duration_ms, 400);
    }

    #[test]
    fn avg_is_over_successes_only() {
        let outcomes = vec![
            outcome(0, 100, None),
            outcome(1, 300, None),
            // A slow failure must not drag the average down.
            outcome(2, 9000, Some(TaskError::Status { status: 500 })),
        ];
        let stats = RunStats::from_outcomes(&outcomes, Duration::from_secs(10));
        assert_eq!(stats.avg_success_ms, Some(200));
    }

    #[test]
    fn avg_is_none_when_nothing_succeeded() {
        let outcomes = vec![outcome(0, 100, Some(TaskError::EmptyDownloadUrl))];
        let stats = RunStats::from_outcomes(&outcomes, Duration::from_millis(100));
        assert_eq!(stats.avg_success_ms, None);
    }

    #[test]
    fn empty_run_is_all_zero() {
        let stats = RunStats::from_outcomes(&[], Duration::ZERO);
        assert_eq!(stats.attempted, 0);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.avg_success_ms, None);
    }

    #[test]
    fn report_round_trips_through_json() {
        let outcomes = vec![outcome(0, 10, None)];
        let stats = RunStats::from_outcomes(&outcomes, Duration::from_millis(10));
        let report = RunReport { outcomes, stats };
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stats.attempted, 1);
        assert!(back.outcomes[0].succeeded());
    }
}
