//! CLI binary for docrelay.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RunConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docrelay::{run, BatchProgressCallback, Protocol, RunConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-file log
/// lines using [indicatif]. Works correctly when tasks complete out of order
/// (concurrent dispatch).
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-task wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    /// Count of tasks that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_run_start` once
    /// discovery has counted the tasks.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Walking directory tree…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0) as f64
            / 1000.0
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_tasks: usize) {
        self.activate_bar(total_tasks);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_tasks} files…"))
        ));
    }

    fn on_task_start(&self, index: usize, _total: usize, source: &Path) {
        self.start_times
            .lock()
            .unwrap()
            .insert(index, Instant::now());
        self.bar
            .set_message(source.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
    }

    fn on_task_complete(&self, index: usize, total: usize, output: &Path) {
        let elapsed = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            output.display(),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_task_error(&self, index: usize, total: usize, error: String) {
        let elapsed = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_tasks: usize, succeeded: usize) {
        let failed = total_tasks.saturating_sub(succeeded);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_tasks {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&succeeded.to_string()),
                total_tasks,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert everything under the current directory with defaults
  docrelay -s http://192.168.2.128:8500

  # Only Word-family files, 8 at a time
  docrelay -f doc,wps -c 8 ./archive

  # Flatten everything convertible to PDF
  docrelay -t pdf ./archive

  # Keep originals in place, mirror outputs under ./converted
  docrelay -o ./converted ./archive

  # Talk to a submit/download service with a 2-minute retention window
  docrelay --protocol upload --retention 120 ./archive

  # Structured report for scripting
  docrelay --json -q ./archive > report.json

TARGET FORMAT RESOLUTION:
  Source      Target
  ─────────   ──────
  doc, wps    docx
  ppt, dps    pptx
  xls, et     xlsx
  (other)     pdf
  An explicit -t/--target overrides the table for every file.

OUTPUT PLACEMENT:
  Without -o, each output lands beside its source and the original moves
  into the backup tree (default ./originals), mirroring its relative path.
  With -o, outputs mirror the scan tree under the given directory and
  originals stay put.

  An existing destination is never overwritten: the new file gets the
  original name embedded, e.g. report.docx -> report_(report.doc).docx.

ENVIRONMENT VARIABLES:
  DOCRELAY_SERVER       Conversion service base address
  DOCRELAY_CONCURRENCY  Parallel conversion count
  DOCRELAY_TARGET       Global target format override
"#;

/// Batch-convert office documents through a remote conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "docrelay",
    version,
    about = "Batch-convert office documents through a remote conversion service",
    long_about = "Scan a directory tree for office documents (doc, ppt, xls, wps, dps, et, …), \
convert each through a remote conversion service, and write the results back without \
overwriting existing files. Originals are archived into a mirrored backup tree unless \
an explicit output directory is given.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory tree to scan.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Conversion service base address.
    #[arg(short, long, env = "DOCRELAY_SERVER", default_value = "http://127.0.0.1:8500")]
    server: String,

    /// Comma-separated extension allow-list (default: doc,ppt,xls,wps,dps,et).
    #[arg(
        short,
        long,
        long_help = "Comma-separated list of extensions to convert, without dots.\n\
          Default: doc,ppt,xls,wps,dps,et. When --target pdf is given without\n\
          this flag, the list widens to every PDF-convertible format."
    )]
    formats: Option<String>,

    /// Number of conversions in flight at once.
    #[arg(short, long, env = "DOCRELAY_CONCURRENCY", default_value_t = 5)]
    concurrency: usize,

    /// Global target format (default: per-file via the extension table).
    #[arg(short, long, env = "DOCRELAY_TARGET")]
    target: Option<String>,

    /// Write outputs under this directory, mirroring the scan tree.
    /// Originals are not archived when set.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Backup tree for successfully converted originals.
    #[arg(long, default_value = "originals")]
    backup_dir: PathBuf,

    /// Wire protocol variant: inline (single round-trip) or upload
    /// (multipart submit + download).
    #[arg(long, value_enum, default_value = "inline")]
    protocol: ProtocolArg,

    /// Server-side retention window in seconds (upload protocol only).
    #[arg(long, default_value_t = 60)]
    retention: u64,

    /// Per-request timeout in seconds (default: 30 inline, 300 upload).
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Output the structured run report as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ProtocolArg {
    Inline,
    Upload,
}

impl From<ProtocolArg> for Protocol {
    fn from(v: ProtocolArg) -> Self {
        match v {
            ProtocolArg::Inline => Protocol::Inline,
            ProtocolArg::Upload => Protocol::Upload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli, show_progress)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run(&config).await.context("Conversion run failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    if report.stats.attempted == 0 {
        if !cli.quiet {
            eprintln!(
                "No convertible files ({}) under {}",
                config.extensions.join(","),
                config.root.display()
            );
        }
        return Ok(());
    }

    // Summary (the callback already printed the final green/red tick).
    if !cli.quiet {
        let stats = &report.stats;
        let avg = stats
            .avg_success_ms
            .map(|ms| format!("{:.2}s/file avg", ms as f64 / 1000.0))
            .unwrap_or_else(|| "no successes".to_string());
        eprintln!(
            "   {} attempted  /  {} converted  —  {:.2}s total, {}",
            dim(&stats.attempted.to_string()),
            dim(&stats.succeeded.to_string()),
            stats.total_duration_ms as f64 / 1000.0,
            dim(&avg),
        );
    }

    Ok(())
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, show_progress: bool) -> Result<RunConfig> {
    let mut builder = RunConfig::builder()
        .server(&cli.server)
        .root(&cli.root)
        .concurrency(cli.concurrency)
        .backup_root(&cli.backup_dir)
        .protocol(cli.protocol.clone().into())
        .retention_secs(cli.retention);

    // Only an explicit -f pins the allow-list; its absence lets a global
    // PDF target widen the default set.
    if let Some(ref formats) = cli.formats {
        builder = builder.extensions(formats.split(','));
    }
    if let Some(ref target) = cli.target {
        builder = builder.target_override(target);
    }
    if let Some(ref output) = cli.output {
        builder = builder.output_root(output);
    }
    if let Some(secs) = cli.request_timeout {
        builder = builder.inline_timeout_secs(secs).upload_timeout_secs(secs);
    }
    if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        builder = builder.progress_callback(cb as Arc<dyn BatchProgressCallback>);
    }

    builder.build().context("Invalid configuration")
}
