//! MachineVisor — capture, annotate, upload and render pipeline core.
//!
//! Orientation from motion sensors, a fixed-period capture scheduler,
//! multipart uploads to the analysis service, and rendering of the
//! returned findings for display and voice readout.

pub mod capture;
pub mod config;
pub mod endpoint;
pub mod events;
pub mod interpret;
pub mod lexicon;
pub mod orientation;
pub mod pipeline;
pub mod pose;
pub mod prefs;
pub mod scheduler;
pub mod types;
pub mod upload;
pub mod voice;

pub use capture::{placeholder_jpeg, Camera, CaptureError, CapturedFrame};
pub use config::VisorConfig;
pub use endpoint::{normalize_base_url, resolve_base_url};
pub use events::{EventBus, PipelineEvent};
pub use interpret::interpret;
pub use orientation::{estimate, OrientationState};
pub use pipeline::{
    Collaborators, Pipeline, PipelineHandle, RunSummary, SensorEvent, SensorKind, StatusDisplay,
};
pub use pose::{classify, PoseStatus};
pub use prefs::{PreferenceStore, Preferences};
pub use scheduler::{CaptureScheduler, Tick};
pub use upload::{AnalysisClient, CaptureRequest, UploadFailure, Uploader};
pub use voice::{SpeechOutput, VoiceTriggerCache};
pub use types::*;
