//! Core data types for orientation, captures, and analysis results.

use serde::{Deserialize, Serialize};

/// A three-axis sensor reading (x, y, z) in the sensor's native unit.
pub type Vector3 = [f64; 3];

/// Latest value of each sensor axis group. No history is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub accel: Vector3,
    pub gyro: Vector3,
}

/// Pitch/roll angles and rotation speed derived from an [`OrientationSample`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseReading {
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub angular_rate_mag: f64,
}

/// One detected object, localized and ranked by pixel area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub class_name: String,
    pub localized_name: String,
    pub location_descriptor: String,
    pub pixel_area: i64,
}

impl Finding {
    /// Render as a display line: `- {name}: {location}`.
    pub fn line(&self) -> String {
        format!("- {}: {}", self.localized_name, self.location_descriptor)
    }
}

/// Interpreted analysis payload.
///
/// `object_count` stays textual: a count the server sends as a
/// non-numeric string is shown verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub object_count: String,
    pub findings: Vec<Finding>,
}

impl AnalysisResult {
    pub fn header(&self) -> String {
        format!("Объектов: {}", self.object_count)
    }

    pub fn lines(&self) -> Vec<String> {
        self.findings.iter().map(Finding::line).collect()
    }

    /// Header followed by one line per finding.
    pub fn display_text(&self) -> String {
        let mut text = self.header();
        for line in self.lines() {
            text.push('\n');
            text.push_str(&line);
        }
        text
    }

    /// Snapshot for the voice readout cache.
    pub fn voice_entry(&self) -> VoiceCacheEntry {
        VoiceCacheEntry {
            header_text: self.header(),
            finding_lines: self.lines(),
        }
    }
}

/// The most recent result, rendered as user-facing text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceCacheEntry {
    pub header_text: String,
    pub finding_lines: Vec<String>,
}

impl VoiceCacheEntry {
    pub fn is_empty(&self) -> bool {
        self.header_text.trim().is_empty() && self.finding_lines.is_empty()
    }
}

/// Success body of `POST /upload`. Every field is optional; `analysis` is
/// left untyped and handed to the interpreter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub status: Option<String>,
    pub saved_as: Option<String>,
    pub size_bytes: Option<i64>,
    pub content_type: Option<String>,
    pub pitch_deg: Option<f64>,
    pub roll_deg: Option<f64>,
    pub seq: Option<i64>,
    pub details: Option<bool>,
    pub analysis: serde_json::Value,
}

/// Errors that can occur in the pipeline library.
#[derive(thiserror::Error, Debug)]
pub enum VisorError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid server address: {0:?}")]
    InvalidEndpoint(String),

    #[error("Preferences error: {0}")]
    Preferences(String),
}

/// Convenience result type.
pub type VisorResult<T> = Result<T, VisorError>;
