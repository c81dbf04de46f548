//! # docrelay
//!
//! Batch-convert office documents through a remote conversion service.
//!
//! ## Why this crate?
//!
//! Legacy office formats (`.doc`, `.wps`, `.ppt`, `.et`, …) accumulate in
//! shared trees faster than anyone converts them. This crate is the client
//! side of that cleanup: it scans a directory, ships every matching file to
//! a conversion service over HTTP, writes the results back without ever
//! clobbering an existing file, and tucks the originals into a mirrored
//! backup tree. The service does the converting; this crate is the
//! dispatcher and protocol client around it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scan root
//!  │
//!  ├─ 1. Discover  walk the tree, keep allow-listed extensions
//!  ├─ 2. Dispatch  bounded worker pool, N tasks in flight
//!  ├─ 3. Convert   inline JSON exchange, or multipart upload + download
//!  ├─ 4. Resolve   collision-safe destination naming
//!  ├─ 5. Write     temp-then-rename, never partial
//!  └─ 6. Archive   move originals into a mirrored backup tree
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docrelay::{run, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .server("http://192.168.2.128:8500")
//!         .root("./inbox")
//!         .concurrency(5)
//!         .build()?;
//!     let report = run(&config).await?;
//!     println!(
//!         "{}/{} converted in {}ms",
//!         report.stats.succeeded, report.stats.attempted, report.stats.total_duration_ms
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docrelay` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! docrelay = { version = "0.1", default-features = false }
//! ```
//!
//! ## Protocol Variants
//!
//! Two service dialects exist in the field; pick one with
//! [`RunConfig::builder`]`.protocol(..)`:
//!
//! | Variant | Round-trips | Payload | Default timeout |
//! |---------|-------------|---------|-----------------|
//! | [`Protocol::Inline`] | 1 | base64 in JSON | 30 s |
//! | [`Protocol::Upload`] | 2 | multipart + download handle | 300 s |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Protocol, RunConfig, RunConfigBuilder};
pub use dispatch::{run, run_with_client};
pub use error::{ArchiveError, RelayError, TaskError};
pub use pipeline::client::{ConversionClient, Converted, InlineClient, UploadClient};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{ConversionTask, RunReport, RunStats, TaskOutcome};
pub use stream::{run_stream, run_stream_with_client, OutcomeStream};
