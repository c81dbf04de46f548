//! Error types for the docrelay library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RelayError`] — **Fatal**: the run cannot proceed at all (discovery
//!   failed, invalid configuration). Returned as `Err(RelayError)` from the
//!   top-level `run*` functions before any task is scheduled.
//!
//! * [`TaskError`] — **Non-fatal**: a single conversion task failed (unreadable
//!   source, transport error, bad status) but all other tasks are fine. Stored
//!   inside [`crate::report::TaskOutcome`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad file.
//!
//! A third type, [`ArchiveError`], covers the archive stage: archival runs
//! after the converted output has already been written, so its failure is
//! recorded on the outcome without downgrading the conversion result.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docrelay library.
///
/// Task-level failures use [`TaskError`] and are stored in
/// [`crate::report::TaskOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The directory walk itself failed (permission denied, vanished entry).
    /// Aborts the run before any tasks are scheduled.
    #[error("failed to scan '{}': {source}", .root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error (HTTP client construction and the like).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single conversion task.
///
/// The variants follow the task's stages in order: reading the source,
/// talking to the service, writing the output. A task terminates on the
/// first error it hits; later stages are never attempted.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum TaskError {
    /// The source file could not be read into memory.
    #[error("failed to read '{}': {detail}", .path.display())]
    Read { path: PathBuf, detail: String },

    /// The conversion request could not be constructed (multipart assembly).
    #[error("failed to build conversion request: {detail}")]
    RequestBuild { detail: String },

    /// Transport-level failure (connection refused, reset, DNS).
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    /// The request exceeded the configured deadline.
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The service answered with a non-200 status.
    #[error("conversion service returned HTTP {status}")]
    Status { status: u16 },

    /// The structured response body could not be decoded.
    #[error("malformed conversion response: {detail}")]
    Decode { detail: String },

    /// HTTP 200 but the response carried no download handle.
    #[error("conversion service returned 200 with an empty download URL")]
    EmptyDownloadUrl,

    /// The converted output could not be written to disk.
    #[error("failed to write output '{}': {detail}", .path.display())]
    Write { path: PathBuf, detail: String },

    /// Both the computed destination and its disambiguated fallback already
    /// exist. Overwriting is never acceptable, so the task fails.
    #[error("output '{}' and fallback '{}' both exist; refusing to overwrite", .path.display(), .fallback.display())]
    OutputConflict { path: PathBuf, fallback: PathBuf },
}

impl TaskError {
    /// Short stage label used in per-task log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            TaskError::Read { .. } => "read",
            TaskError::RequestBuild { .. }
            | TaskError::Transport { .. }
            | TaskError::Timeout { .. }
            | TaskError::Status { .. } => "request",
            TaskError::Decode { .. } | TaskError::EmptyDownloadUrl => "decode",
            TaskError::Write { .. } | TaskError::OutputConflict { .. } => "write",
        }
    }
}

/// A failure while relocating a successfully converted source into the
/// backup tree. Never downgrades the conversion itself.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ArchiveError {
    /// The mirrored backup directory could not be created.
    #[error("failed to create backup directory '{}': {detail}", .path.display())]
    CreateDir { path: PathBuf, detail: String },

    /// Rename and the copy fallback both failed.
    #[error("failed to move '{}' to '{}': {detail}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        detail: String,
    },

    /// The fallback copy produced fewer bytes than the source holds; the
    /// incomplete copy is removed and the source left in place.
    #[error("backup copy of '{}' is incomplete ({copied} of {expected} bytes)", .from.display())]
    Verify {
        from: PathBuf,
        copied: u64,
        expected: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_carries_code() {
        let e = TaskError::Status { status: 500 };
        assert!(e.to_string().contains("500"), "got: {e}");
    }

    #[test]
    fn timeout_display() {
        let e = TaskError::Timeout {
            url: "http://srv/convert".into(),
            secs: 30,
        };
        let msg = e.to_string();
        assert!(msg.contains("30s"));
        assert!(msg.contains("http://srv/convert"));
    }

    #[test]
    fn output_conflict_names_both_paths() {
        let e = TaskError::OutputConflict {
            path: PathBuf::from("a/report.docx"),
            fallback: PathBuf::from("a/report_(report.doc).docx"),
        };
        let msg = e.to_string();
        assert!(msg.contains("report.docx"));
        assert!(msg.contains("report_(report.doc).docx"));
    }

    #[test]
    fn stage_labels() {
        assert_eq!(
            TaskError::Read {
                path: "x".into(),
                detail: "gone".into()
            }
            .stage(),
            "read"
        );
        assert_eq!(TaskError::Status { status: 502 }.stage(), "request");
        assert_eq!(TaskError::EmptyDownloadUrl.stage(), "decode");
        assert_eq!(
            TaskError::Write {
                path: "x".into(),
                detail: "disk full".into()
            }
            .stage(),
            "write"
        );
    }

    #[test]
    fn verify_display_counts_bytes() {
        let e = ArchiveError::Verify {
            from: PathBuf::from("report.doc"),
            copied: 10,
            expected: 20,
        };
        assert!(e.to_string().contains("10 of 20"));
    }
}
