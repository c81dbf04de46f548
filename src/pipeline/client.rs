//! Wire protocol with the remote conversion service.
//!
//! Two observed dialects of the same service exist in the field, so the
//! dispatcher talks to a trait and the variant is chosen once from
//! configuration:
//!
//! * [`InlineClient`] — one round-trip. The file travels base64-encoded in a
//!   JSON body and the converted bytes come straight back in the response.
//! * [`UploadClient`] — two round-trips. A streaming multipart upload returns
//!   a small JSON record with a download handle; a second GET fetches the
//!   converted bytes. The handle expires after the requested retention
//!   window.
//!
//! Neither variant retries: a timeout, transport error, or non-200 status is
//! a terminal failure for the task that issued it, carried back as a
//! [`TaskError`] with enough detail to correlate.

use crate::config::{Protocol, RunConfig};
use crate::error::{RelayError, TaskError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The converted document, plus whatever diagnostics the protocol surfaced.
#[derive(Debug, Clone)]
pub struct Converted {
    /// Raw bytes of the converted file, ready to write.
    pub bytes: Vec<u8>,
    /// Server-side retention window echoed by the upload variant; `None`
    /// for the inline variant.
    pub retention_secs: Option<u64>,
}

/// Submit content, obtain the converted bytes.
///
/// Implementations are protocol-specific; the dispatcher never looks past
/// this seam. `source_type` and `target_type` are extension strings without
/// a leading dot.
#[async_trait]
pub trait ConversionClient: Send + Sync {
    async fn convert(
        &self,
        content: &[u8],
        source_type: &str,
        target_type: &str,
    ) -> Result<Converted, TaskError>;
}

/// Build the client the configuration asks for.
pub fn client_for(config: &RunConfig) -> Result<Arc<dyn ConversionClient>, RelayError> {
    Ok(match config.protocol {
        Protocol::Inline => Arc::new(InlineClient::new(&config.server, config.inline_timeout_secs)?),
        Protocol::Upload => Arc::new(UploadClient::new(
            &config.server,
            config.upload_timeout_secs,
            config.retention_secs,
        )?),
    })
}

fn build_http(timeout_secs: u64) -> Result<reqwest::Client, RelayError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RelayError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest failure to the task-level taxonomy, distinguishing
/// deadline expiry from other transport faults.
fn transport_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> TaskError {
    if e.is_timeout() {
        TaskError::Timeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        TaskError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        }
    }
}

fn check_ok(status: StatusCode) -> Result<(), TaskError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(TaskError::Status {
            status: status.as_u16(),
        })
    }
}

// ── Inline variant ───────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineRequest<'a> {
    file_bytes: String,
    target_type: &'a str,
    source_type: &'a str,
}

/// Single round-trip client: base64 JSON in, converted bytes out.
pub struct InlineClient {
    http: reqwest::Client,
    convert_url: String,
    timeout_secs: u64,
}

impl InlineClient {
    pub fn new(server: &str, timeout_secs: u64) -> Result<Self, RelayError> {
        Ok(Self {
            http: build_http(timeout_secs)?,
            convert_url: format!("{}/convert", server.trim_end_matches('/')),
            timeout_secs,
        })
    }
}

#[async_trait]
impl ConversionClient for InlineClient {
    async fn convert(
        &self,
        content: &[u8],
        source_type: &str,
        target_type: &str,
    ) -> Result<Converted, TaskError> {
        let body = InlineRequest {
            file_bytes: BASE64.encode(content),
            target_type,
            source_type,
        };

        debug!("POST {} ({} bytes, {source_type} -> {target_type})", self.convert_url, content.len());
        let response = self
            .http
            .post(&self.convert_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&self.convert_url, self.timeout_secs, e))?;

        check_ok(response.status())?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&self.convert_url, self.timeout_secs, e))?;

        Ok(Converted {
            bytes: bytes.to_vec(),
            retention_secs: None,
        })
    }
}

// ── Upload variant ───────────────────────────────────────────────────────

/// The small record the upload endpoint returns instead of file content.
///
/// All fields default so a sparse body decodes; the handle is validated
/// separately because an empty `download_url` under HTTP 200 is a known
/// service failure mode, not a success.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    #[allow(dead_code)]
    message: String,
    #[serde(default)]
    download_url: String,
    #[serde(default)]
    retention_time: u64,
}

/// Two-round-trip client: multipart upload, then handle-based download.
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    retention_secs: u64,
}

impl UploadClient {
    pub fn new(server: &str, timeout_secs: u64, retention_secs: u64) -> Result<Self, RelayError> {
        Ok(Self {
            http: build_http(timeout_secs)?,
            base_url: server.trim_end_matches('/').to_string(),
            timeout_secs,
            retention_secs,
        })
    }

    fn convert_url(&self) -> String {
        format!("{}/convert", self.base_url)
    }

    fn download_url(&self, handle: &str) -> String {
        format!("{}/download/{}", self.base_url, handle)
    }
}

/// Last path segment of a download URL — the service accepts only the
/// basename on its download route.
fn download_basename(download_url: &str) -> &str {
    download_url.rsplit('/').next().unwrap_or(download_url)
}

#[async_trait]
impl ConversionClient for UploadClient {
    async fn convert(
        &self,
        content: &[u8],
        source_type: &str,
        target_type: &str,
    ) -> Result<Converted, TaskError> {
        let part = reqwest::multipart::Part::bytes(content.to_vec())
            .file_name(format!("source.{source_type}"))
            .mime_str("application/octet-stream")
            .map_err(|e| TaskError::RequestBuild {
                detail: e.to_string(),
            })?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("target_format", target_type.to_string())
            .text("retention_time", self.retention_secs.to_string());

        let convert_url = self.convert_url();
        debug!("POST {} ({} bytes, multipart, -> {target_type})", convert_url, content.len());
        let response = self
            .http
            .post(&convert_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&convert_url, self.timeout_secs, e))?;

        check_ok(response.status())?;

        let record: UploadResponse =
            response.json().await.map_err(|e| TaskError::Decode {
                detail: e.to_string(),
            })?;
        if record.download_url.is_empty() {
            return Err(TaskError::EmptyDownloadUrl);
        }

        let download_url = self.download_url(download_basename(&record.download_url));
        debug!("GET {download_url}");
        let response = self
            .http
            .get(&download_url)
            .send()
            .await
            .map_err(|e| transport_error(&download_url, self.timeout_secs, e))?;

        check_ok(response.status())?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&download_url, self.timeout_secs, e))?;

        Ok(Converted {
            bytes: bytes.to_vec(),
            retention_secs: Some(record.retention_time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_request_uses_service_field_names() {
        let req = InlineRequest {
            file_bytes: BASE64.encode(b"hello"),
            target_type: "docx",
            source_type: "doc",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["fileBytes"], BASE64.encode(b"hello"));
        assert_eq!(json["targetType"], "docx");
        assert_eq!(json["sourceType"], "doc");
    }

    #[test]
    fn upload_response_decodes_full_record() {
        let record: UploadResponse = serde_json::from_str(
            r#"{"message":"ok","download_url":"/download/abc123.docx","retention_time":60}"#,
        )
        .unwrap();
        assert_eq!(record.download_url, "/download/abc123.docx");
        assert_eq!(record.retention_time, 60);
    }

    #[test]
    fn upload_response_tolerates_sparse_body() {
        // A missing handle decodes to empty string and is rejected later.
        let record: UploadResponse = serde_json::from_str(r#"{"message":"accepted"}"#).unwrap();
        assert!(record.download_url.is_empty());
    }

    #[test]
    fn download_basename_takes_last_segment() {
        assert_eq!(download_basename("/download/abc123.docx"), "abc123.docx");
        assert_eq!(
            download_basename("http://srv:8500/download/x.pdf"),
            "x.pdf"
        );
        assert_eq!(download_basename("bare-handle"), "bare-handle");
    }

    #[test]
    fn urls_are_joined_without_double_slashes() {
        let client = UploadClient::new("http://srv:8500/", 300, 60).unwrap();
        assert_eq!(client.convert_url(), "http://srv:8500/convert");
        assert_eq!(
            client.download_url("abc.docx"),
            "http://srv:8500/download/abc.docx"
        );

        let inline = InlineClient::new("http://srv:8500", 30).unwrap();
        assert_eq!(inline.convert_url, "http://srv:8500/convert");
    }

    #[test]
    fn client_for_matches_protocol() {
        let inline_cfg = RunConfig::default();
        assert!(client_for(&inline_cfg).is_ok());

        let upload_cfg = RunConfig::builder()
            .protocol(Protocol::Upload)
            .build()
            .unwrap();
        assert!(client_for(&upload_cfg).is_ok());
    }
}
