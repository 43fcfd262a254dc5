//! Pipeline event bus.
//!
//! Observers (logs, test harnesses, a debug overlay) subscribe to a
//! `tokio::sync::broadcast` channel of [`PipelineEvent`]s. With no
//! subscribers, events are dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Everything the pipeline reports while running.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// The scheduler fired.
    Tick { index: u64 },
    /// The camera was unavailable or failed; a placeholder was shown.
    PlaceholderShown { index: u64, reason: String },
    /// A capture was handed to the upload pipeline.
    UploadStarted { seq: u32, pitch_deg: f64, roll_deg: f64 },
    /// An upload produced a result that was applied to the display.
    UploadCompleted { seq: u32, object_count: String, findings: usize, elapsed_ms: u64 },
    /// An upload failed.
    UploadFailed { seq: u32, status: Option<u16>, error: String, elapsed_ms: u64 },
    /// A completion arrived after a newer one had been applied.
    StaleResultDropped { seq: u32, latest_applied: u32 },
    /// The cached result was read aloud.
    ReadoutSpoken { text: String, rate: f32 },
    /// The pipeline stopped.
    Stopped { ticks: u64, sequences_issued: u32 },
}

impl PipelineEvent {
    /// Sequence number the event refers to, if any.
    pub fn seq(&self) -> Option<u32> {
        match self {
            PipelineEvent::UploadStarted { seq, .. }
            | PipelineEvent::UploadCompleted { seq, .. }
            | PipelineEvent::UploadFailed { seq, .. }
            | PipelineEvent::StaleResultDropped { seq, .. } => Some(*seq),
            _ => None,
        }
    }
}

/// Broadcast channel carrying [`PipelineEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}
