//! Configuration for a batch conversion run.
//!
//! All behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. The config is immutable after `build()` and `Clone`,
//! so it can be handed to every component and every in-flight task without
//! synchronisation.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::RelayError;
use crate::mapping;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which wire protocol the conversion service speaks.
///
/// Both variants implement the same contract — submit content, obtain the
/// converted bytes — and the rest of the pipeline never looks at which one
/// is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Single round-trip: base64 content in a JSON body, converted bytes in
    /// the response body. (default)
    #[default]
    Inline,
    /// Two round-trips: multipart upload returning a download handle, then a
    /// second request to fetch the converted bytes.
    Upload,
}

/// Configuration for a batch conversion run.
///
/// Built via [`RunConfig::builder()`] or [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use docrelay::RunConfig;
///
/// let config = RunConfig::builder()
///     .server("http://192.168.2.128:8500")
///     .concurrency(8)
///     .extensions(["doc", "wps"])
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Base address of the conversion service. Default: `http://127.0.0.1:8500`.
    pub server: String,

    /// Directory tree to scan for convertible files. Default: `.`.
    pub root: PathBuf,

    /// Allow-listed extensions, normalised to lowercase with a leading dot
    /// (`.doc`, `.ppt`, …). Default: `.doc .ppt .xls .wps .dps .et`.
    ///
    /// When the target override is `pdf` and no explicit list was given, the
    /// set widens to every PDF-convertible format — the point of a global
    /// PDF run is to sweep everything the service can flatten.
    pub extensions: Vec<String>,

    /// Number of conversion tasks in flight at once. Default: 5.
    ///
    /// The service serialises conversions per worker process, so raising this
    /// past the server's worker count only queues requests remotely. Lower it
    /// if the service starts timing out under load.
    pub concurrency: usize,

    /// Global target format override. `None` resolves per file through the
    /// extension table in [`crate::mapping`].
    pub target_override: Option<String>,

    /// Explicit output directory. `None` writes each output beside its source
    /// and archives the original; `Some` mirrors the scan tree under this
    /// root and leaves originals in place.
    pub output_root: Option<PathBuf>,

    /// Root of the backup tree that successfully converted originals are
    /// moved into (only when `output_root` is `None`). Default: `originals`.
    pub backup_root: PathBuf,

    /// Wire protocol variant. Default: [`Protocol::Inline`].
    pub protocol: Protocol,

    /// Server-side retention window in seconds for the upload variant's
    /// download handle. Default: 60.
    pub retention_secs: u64,

    /// Per-request deadline for the inline variant in seconds. Default: 30.
    ///
    /// The inline round-trip carries the whole payload both ways in one
    /// request, so a conversion that takes longer than this has almost
    /// certainly wedged the service.
    pub inline_timeout_secs: u64,

    /// Per-request deadline for the upload variant in seconds. Default: 300.
    ///
    /// Streaming uploads of large decks are slow on thin links; the longer
    /// deadline reflects payload size, not service speed.
    pub upload_timeout_secs: u64,

    /// Optional per-task progress callback. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:8500".to_string(),
            root: PathBuf::from("."),
            extensions: normalize_extensions(["doc", "ppt", "xls", "wps", "dps", "et"]),
            concurrency: 5,
            target_override: None,
            output_root: None,
            backup_root: PathBuf::from("originals"),
            protocol: Protocol::Inline,
            retention_secs: 60,
            inline_timeout_secs: 30,
            upload_timeout_secs: 300,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("server", &self.server)
            .field("root", &self.root)
            .field("extensions", &self.extensions)
            .field("concurrency", &self.concurrency)
            .field("target_override", &self.target_override)
            .field("output_root", &self.output_root)
            .field("backup_root", &self.backup_root)
            .field("protocol", &self.protocol)
            .field("retention_secs", &self.retention_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
            extensions_named: false,
        }
    }

    /// The request deadline for the active protocol variant.
    pub fn request_timeout_secs(&self) -> u64 {
        match self.protocol {
            Protocol::Inline => self.inline_timeout_secs,
            Protocol::Upload => self.upload_timeout_secs,
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
    extensions_named: bool,
}

impl RunConfigBuilder {
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.config.server = server.into();
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Set the extension allow-list. Entries are trimmed, lowercased, and
    /// given a leading dot; a pre-dotted entry is accepted as-is.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.extensions = normalize_extensions(extensions);
        self.extensions_named = true;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn target_override(mut self, target: impl Into<String>) -> Self {
        self.config.target_override = Some(target.into());
        self
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = Some(root.into());
        self
    }

    pub fn backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.backup_root = root.into();
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    pub fn retention_secs(mut self, secs: u64) -> Self {
        self.config.retention_secs = secs;
        self
    }

    pub fn inline_timeout_secs(mut self, secs: u64) -> Self {
        self.config.inline_timeout_secs = secs;
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<RunConfig, RelayError> {
        // A global PDF run with no explicit list sweeps every format the
        // service can flatten.
        if self.config.target_override.as_deref() == Some("pdf") && !self.extensions_named {
            self.config.extensions = normalize_extensions(mapping::PDF_COMPATIBLE.iter().copied());
        }

        let c = &self.config;
        if c.server.trim().is_empty() {
            return Err(RelayError::InvalidConfig("server address is empty".into()));
        }
        if c.concurrency == 0 {
            return Err(RelayError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if c.extensions.is_empty() {
            return Err(RelayError::InvalidConfig(
                "extension allow-list is empty".into(),
            ));
        }
        if c.inline_timeout_secs == 0 || c.upload_timeout_secs == 0 {
            return Err(RelayError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Normalise extensions to lowercase with a leading dot.
fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|e| {
            let e = e.as_ref().trim().to_lowercase();
            if e.starts_with('.') {
                e
            } else {
                format!(".{e}")
            }
        })
        .filter(|e| e.len() > 1)
        .collect()
}
