//! Upload pipeline: one capture plus its orientation snapshot → analysis result.
//!
//! Each request is a multipart `POST {base}upload` carrying the JPEG and
//! four scalar fields. The endpoint is re-resolved from preferences on
//! every upload; the HTTP client is cached per base URL.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::capture::CapturedFrame;
use crate::endpoint::{endpoint_url, resolve_base_url};
use crate::interpret::interpret;
use crate::prefs::PreferenceStore;
use crate::types::{AnalysisResult, PoseReading, UploadResponse, VisorError};

/// Everything sent for one capture. Dropping it releases the frame's
/// backing file.
#[derive(Debug)]
pub struct CaptureRequest {
    pub frame: CapturedFrame,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub sequence_number: u32,
    pub details_requested: bool,
}

impl CaptureRequest {
    pub fn new(frame: CapturedFrame, pose: &PoseReading, sequence_number: u32, details: bool) -> Self {
        Self {
            frame,
            pitch_deg: pose.pitch_deg,
            roll_deg: pose.roll_deg,
            sequence_number,
            details_requested: details,
        }
    }

    fn file_name(&self) -> String {
        format!("mv_capture_{}.jpg", self.sequence_number)
    }

    /// Build the multipart body. The JPEG bytes move into the form; the
    /// backing file guard stays with `self`.
    fn take_form(&mut self) -> Result<Form, UploadFailure> {
        let image = Part::bytes(std::mem::take(&mut self.frame.bytes))
            .file_name(self.file_name())
            .mime_str("image/jpeg")
            .map_err(|e| UploadFailure::Transport(e.to_string()))?;

        Ok(Form::new()
            .part("image", image)
            .text("pitch_deg", self.pitch_deg.to_string())
            .text("roll_deg", self.roll_deg.to_string())
            .text("seq", self.sequence_number.to_string())
            .text("details", self.details_requested.to_string()))
    }
}

/// Why an upload produced no result. `Display` is the status-line text.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UploadFailure {
    #[error("Некорректный адрес сервера")]
    InvalidEndpoint(String),

    #[error("Upload error: {0}")]
    Transport(String),

    #[error("Upload failed: {code}{}", body_suffix(.message))]
    Status { code: u16, message: String },

    #[error("Upload error: unreadable response: {0}")]
    Decode(String),
}

fn body_suffix(message: &str) -> String {
    if message.trim().is_empty() {
        String::new()
    } else {
        format!("\n{message}")
    }
}

impl UploadFailure {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UploadFailure::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<VisorError> for UploadFailure {
    fn from(e: VisorError) -> Self {
        match e {
            VisorError::InvalidEndpoint(raw) => UploadFailure::InvalidEndpoint(raw),
            other => UploadFailure::Transport(other.to_string()),
        }
    }
}

/// The analysis service as seen by the pipeline.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Upload one capture and interpret the response.
    async fn submit(&self, request: CaptureRequest) -> Result<AnalysisResult, UploadFailure>;
}

struct CachedClient {
    base_url: String,
    client: reqwest::Client,
}

/// HTTP implementation of [`AnalysisClient`].
pub struct Uploader {
    prefs: Arc<PreferenceStore>,
    timeout: Duration,
    cached: Mutex<Option<CachedClient>>,
}

impl Uploader {
    pub fn new(prefs: Arc<PreferenceStore>, timeout: Duration) -> Self {
        Self {
            prefs,
            timeout,
            cached: Mutex::new(None),
        }
    }

    /// Normalized base URL for the next request.
    pub fn base_url(&self) -> Result<String, UploadFailure> {
        Ok(resolve_base_url(self.prefs.server_base_url().as_deref())?)
    }

    fn client_for(&self, base_url: &str) -> reqwest::Client {
        let mut guard = self.cached.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(cached) = guard.as_ref().filter(|c| c.base_url == base_url) {
            return cached.client.clone();
        }

        tracing::debug!("Building HTTP client for {base_url}");
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .unwrap_or_default();
        *guard = Some(CachedClient {
            base_url: base_url.to_string(),
            client: client.clone(),
        });
        client
    }

    /// Probe `GET {base}health`.
    pub async fn health(&self) -> Result<bool, UploadFailure> {
        let base = self.base_url()?;
        let url = endpoint_url(&base, "health")?;

        match self.client_for(&base).get(url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!("Health check failed: {e}");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl AnalysisClient for Uploader {
    async fn submit(&self, mut request: CaptureRequest) -> Result<AnalysisResult, UploadFailure> {
        let seq = request.sequence_number;
        let base = self.base_url()?;
        let url = endpoint_url(&base, "upload")?;
        let client = self.client_for(&base);
        let form = request.take_form()?;

        tracing::debug!(
            "Uploading seq={} pitch={:.1} roll={:.1} to {}",
            seq,
            request.pitch_deg,
            request.roll_deg,
            url
        );

        let response = client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadFailure::Status {
                code: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| UploadFailure::Transport(e.to_string()))?;
        let body: Value =
            serde_json::from_str(&text).map_err(|e| UploadFailure::Decode(e.to_string()))?;

        match serde_json::from_value::<UploadResponse>(body.clone()) {
            Ok(meta) => {
                tracing::debug!(
                    "Upload seq={} accepted: status={:?} saved_as={:?} size={:?}",
                    seq,
                    meta.status,
                    meta.saved_as,
                    meta.size_bytes
                );
                if meta.seq.is_some_and(|echo| echo != i64::from(seq)) {
                    tracing::warn!("Server echoed seq={:?} for upload seq={}", meta.seq, seq);
                }
            }
            Err(e) => tracing::debug!("Upload seq={seq} metadata not recognised: {e}"),
        }

        let analysis = body.get("analysis").cloned().unwrap_or(Value::Null);
        Ok(interpret(&analysis))
        // `request` drops here, releasing any backing file.
    }
}

/// Best-effort text from an error body: `error`/`message`/`detail` string
/// fields of a JSON object, else the trimmed body.
pub fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        let parts: Vec<&str> = ["error", "message", "detail"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .collect();
        if !parts.is_empty() {
            return parts.join(": ");
        }
    }
    trimmed.to_string()
}
