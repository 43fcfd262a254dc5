//! Main sequence: wires sensors, the capture scheduler, uploads and the
//! voice trigger together.
//!
//! All display updates happen on the task running [`Pipeline::run`].
//! Captures and uploads run on spawned tasks and report back through the
//! pipeline inbox, so a slow upload never delays the next tick.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch, Notify};
use tokio::time::Instant;

use crate::capture::{placeholder_jpeg, Camera};
use crate::config::VisorConfig;
use crate::events::{EventBus, PipelineEvent};
use crate::orientation::OrientationState;
use crate::pose::classify;
use crate::prefs::PreferenceStore;
use crate::scheduler::{CaptureScheduler, Tick};
use crate::types::{AnalysisResult, OrientationSample, PoseReading, Vector3, VisorError};
use crate::upload::{AnalysisClient, CaptureRequest, UploadFailure};
use crate::voice::{SpeechOutput, VoiceTriggerCache, VOICE_TEST_PHRASE};

pub const SENSORS_ACTIVE_TEXT: &str = "Sensors active - Data updating in real-time";
pub const SENSOR_UNRELIABLE_TEXT: &str = "Sensor data unreliable";
pub const INVALID_SERVER_TEXT: &str = "Некорректный адрес сервера";

/// Status and image surface of the host UI.
pub trait StatusDisplay: Send + Sync {
    /// Orientation and sensor status.
    fn show_pose_status(&self, text: &str);
    /// Capture, upload and analysis status.
    fn show_capture_status(&self, text: &str);
    /// Latest frame (camera or placeholder), JPEG-encoded.
    fn show_image(&self, jpeg: &[u8]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
}

impl SensorKind {
    pub fn unavailable_text(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "Accelerometer not available",
            SensorKind::Gyroscope => "Gyroscope not available",
        }
    }
}

/// Input from the motion sensors.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Accel(Vector3),
    Gyro(Vector3),
    /// The sensor does not exist or could not be started.
    Unavailable(SensorKind),
    /// The platform flagged low accuracy.
    Unreliable(SensorKind),
}

/// Counters reported when [`Pipeline::run`] returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub sequences_issued: u32,
    pub uploads_succeeded: u32,
    pub uploads_failed: u32,
    pub placeholders: u64,
    pub stale_dropped: u32,
}

enum Inbox {
    Sensor(SensorEvent),
    Captured {
        seq: u32,
        image: Vec<u8>,
        pose: PoseReading,
    },
    CaptureFailed {
        seq: u32,
        tick: u64,
        error: String,
    },
    UploadDone {
        seq: u32,
        outcome: Result<AnalysisResult, UploadFailure>,
        elapsed: Duration,
    },
    Utterance(String),
    SaveServerUrl(String),
    SpeakTest,
}

/// Cloneable entry point for collaborators feeding the running pipeline.
///
/// Every method returns `false` once the pipeline has stopped.
#[derive(Clone)]
pub struct PipelineHandle {
    inbox: mpsc::UnboundedSender<Inbox>,
    shutdown: Arc<Notify>,
}

impl PipelineHandle {
    pub fn sensor(&self, event: SensorEvent) -> bool {
        self.inbox.send(Inbox::Sensor(event)).is_ok()
    }

    /// Recognized speech, all alternatives joined with spaces.
    pub fn utterance(&self, text: impl Into<String>) -> bool {
        self.inbox.send(Inbox::Utterance(text.into())).is_ok()
    }

    pub fn save_server_url(&self, raw: impl Into<String>) -> bool {
        self.inbox.send(Inbox::SaveServerUrl(raw.into())).is_ok()
    }

    pub fn speak_test_phrase(&self) -> bool {
        self.inbox.send(Inbox::SpeakTest).is_ok()
    }

    /// Stop the scheduler and the main sequence. Uploads still in flight
    /// finish in the background; their results are discarded.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// External pieces the pipeline drives.
pub struct Collaborators {
    pub camera: Arc<dyn Camera>,
    pub display: Arc<dyn StatusDisplay>,
    pub speech: Arc<dyn SpeechOutput>,
    pub client: Arc<dyn AnalysisClient>,
}

pub struct Pipeline {
    config: VisorConfig,
    prefs: Arc<PreferenceStore>,
    camera: Arc<dyn Camera>,
    display: Arc<dyn StatusDisplay>,
    speech: Arc<dyn SpeechOutput>,
    client: Arc<dyn AnalysisClient>,
    orientation: OrientationState,
    voice: Arc<VoiceTriggerCache>,
    events: EventBus,
    inbox_tx: mpsc::UnboundedSender<Inbox>,
    inbox_rx: mpsc::UnboundedReceiver<Inbox>,
    shutdown: Arc<Notify>,
}

impl Pipeline {
    pub fn new(config: VisorConfig, prefs: Arc<PreferenceStore>, parts: Collaborators) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let events = EventBus::new(config.event_capacity);
        Self {
            config,
            prefs,
            camera: parts.camera,
            display: parts.display,
            speech: parts.speech,
            client: parts.client,
            orientation: OrientationState::new(),
            voice: Arc::new(VoiceTriggerCache::new()),
            events,
            inbox_tx,
            inbox_rx,
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            inbox: self.inbox_tx.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn voice_cache(&self) -> Arc<VoiceTriggerCache> {
        Arc::clone(&self.voice)
    }

    pub fn orientation(&self) -> watch::Receiver<OrientationSample> {
        self.orientation.subscribe()
    }

    /// Run until shutdown, or until the tick limit is reached and every
    /// in-flight upload has reported back.
    pub async fn run(self) -> RunSummary {
        let Pipeline {
            config,
            prefs,
            camera,
            display,
            speech,
            client,
            orientation,
            voice,
            events,
            inbox_tx,
            mut inbox_rx,
            shutdown,
        } = self;

        let mut seq = MainSequence {
            config,
            prefs,
            camera,
            display,
            speech,
            client,
            orientation,
            voice,
            events,
            inbox: inbox_tx,
            sequence: SequenceCounter::new(),
            latest_applied: 0,
            latest_image: 0,
            in_flight: 0,
            reported_unavailable: Vec::new(),
            summary: RunSummary::default(),
        };

        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
        let scheduler = CaptureScheduler::new(seq.config.capture_interval)
            .with_limit(seq.config.tick_limit)
            .spawn(tick_tx);

        seq.display.show_pose_status(SENSORS_ACTIVE_TEXT);
        if seq.camera.is_ready() {
            seq.display.show_capture_status(&format!(
                "Camera active - Capturing every {} seconds",
                seq.config.capture_interval.as_secs_f64()
            ));
        }
        tracing::info!("pipeline started");

        let mut ticks_open = true;
        loop {
            if !ticks_open && seq.in_flight == 0 {
                while let Ok(msg) = inbox_rx.try_recv() {
                    seq.on_message(msg);
                }
                break;
            }
            tokio::select! {
                biased;

                _ = shutdown.notified() => {
                    tracing::info!("pipeline shutdown requested");
                    break;
                }
                tick = tick_rx.recv(), if ticks_open => match tick {
                    Some(tick) => seq.on_tick(tick),
                    None => {
                        tracing::debug!("scheduler finished, {} uploads in flight", seq.in_flight);
                        ticks_open = false;
                    }
                },
                Some(msg) = inbox_rx.recv() => seq.on_message(msg),
            }
        }

        scheduler.stop().await;
        let summary = seq.summary.clone();
        seq.events.emit(PipelineEvent::Stopped {
            ticks: summary.ticks,
            sequences_issued: summary.sequences_issued,
        });
        tracing::info!(
            "pipeline stopped: {} ticks, {} sequences, {} ok, {} failed, {} placeholders",
            summary.ticks,
            summary.sequences_issued,
            summary.uploads_succeeded,
            summary.uploads_failed,
            summary.placeholders
        );
        summary
    }
}

/// Largest sequence number the upload contract can carry (`seq` is an int32).
pub const MAX_SEQUENCE: u32 = i32::MAX as u32;

/// Issues capture sequence numbers: 1, 2, 3, ... up to [`MAX_SEQUENCE`],
/// then nothing. Numbers are never reused.
#[derive(Debug, Clone, Copy)]
pub struct SequenceCounter {
    next: u32,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn issue(&mut self) -> Option<u32> {
        if self.next > MAX_SEQUENCE {
            return None;
        }
        let seq = self.next;
        self.next += 1;
        Some(seq)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by the main sequence while running.
struct MainSequence {
    config: VisorConfig,
    prefs: Arc<PreferenceStore>,
    camera: Arc<dyn Camera>,
    display: Arc<dyn StatusDisplay>,
    speech: Arc<dyn SpeechOutput>,
    client: Arc<dyn AnalysisClient>,
    orientation: OrientationState,
    voice: Arc<VoiceTriggerCache>,
    events: EventBus,
    inbox: mpsc::UnboundedSender<Inbox>,
    sequence: SequenceCounter,
    /// Highest sequence whose upload outcome has been applied.
    latest_applied: u32,
    /// Highest sequence whose frame has been shown.
    latest_image: u32,
    in_flight: usize,
    reported_unavailable: Vec<SensorKind>,
    summary: RunSummary,
}

impl MainSequence {
    fn on_tick(&mut self, tick: Tick) {
        self.summary.ticks += 1;
        self.events.emit(PipelineEvent::Tick { index: tick.index });

        if !self.camera.is_ready() {
            self.show_placeholder(tick.index, "camera not ready", None);
            return;
        }

        let Some(seq) = self.sequence.issue() else {
            tracing::error!("sequence numbers exhausted, tick {} not uploaded", tick.index);
            self.show_placeholder(tick.index, "sequence numbers exhausted", None);
            return;
        };
        self.summary.sequences_issued += 1;
        self.in_flight += 1;
        tracing::debug!("tick {} → capture seq {seq}", tick.index);

        let camera = Arc::clone(&self.camera);
        let client = Arc::clone(&self.client);
        let inbox = self.inbox.clone();
        let orientation = self.orientation.subscribe();
        let details = self.config.details;
        let tick = tick.index;

        tokio::spawn(async move {
            let frame = match camera.capture().await {
                Ok(frame) => frame,
                Err(e) => {
                    let _ = inbox.send(Inbox::CaptureFailed {
                        seq,
                        tick,
                        error: e.to_string(),
                    });
                    return;
                }
            };

            // orientation as of the moment the frame arrived
            let pose = orientation.borrow().pose();
            let _ = inbox.send(Inbox::Captured {
                seq,
                image: frame.bytes.clone(),
                pose,
            });

            let request = CaptureRequest::new(frame, &pose, seq, details);
            let started = Instant::now();
            let outcome = client.submit(request).await;
            let _ = inbox.send(Inbox::UploadDone {
                seq,
                outcome,
                elapsed: started.elapsed(),
            });
        });
    }

    fn on_message(&mut self, msg: Inbox) {
        match msg {
            Inbox::Sensor(event) => self.on_sensor(event),
            Inbox::Captured { seq, image, pose } => {
                self.events.emit(PipelineEvent::UploadStarted {
                    seq,
                    pitch_deg: pose.pitch_deg,
                    roll_deg: pose.roll_deg,
                });
                if seq > self.latest_image {
                    self.latest_image = seq;
                    self.display.show_image(&image);
                }
            }
            Inbox::CaptureFailed { seq, tick, error } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                tracing::warn!("capture {seq} (tick {tick}) failed: {error}");
                self.show_placeholder(tick, &error, Some(&format!("Capture error: {error}")));
            }
            Inbox::UploadDone {
                seq,
                outcome,
                elapsed,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_upload_done(seq, outcome, elapsed);
            }
            Inbox::Utterance(text) => self.on_utterance(&text),
            Inbox::SaveServerUrl(raw) => self.on_save_server_url(&raw),
            Inbox::SpeakTest => {
                let rate = self.prefs.tts_speed();
                self.speech.speak(VOICE_TEST_PHRASE, rate);
            }
        }
    }

    fn on_sensor(&mut self, event: SensorEvent) {
        let reading = match event {
            SensorEvent::Accel(v) => self.orientation.update_accel(v),
            SensorEvent::Gyro(v) => self.orientation.update_gyro(v),
            SensorEvent::Unavailable(kind) => {
                if !self.reported_unavailable.contains(&kind) {
                    self.reported_unavailable.push(kind);
                    tracing::warn!("{}", kind.unavailable_text());
                    self.display.show_pose_status(kind.unavailable_text());
                }
                return;
            }
            SensorEvent::Unreliable(kind) => {
                tracing::debug!("{kind:?} reported low accuracy");
                self.display.show_pose_status(SENSOR_UNRELIABLE_TEXT);
                return;
            }
        };
        self.display.show_pose_status(&classify(&reading).status_text());
    }

    fn on_upload_done(
        &mut self,
        seq: u32,
        outcome: Result<AnalysisResult, UploadFailure>,
        elapsed: Duration,
    ) {
        let elapsed_ms = elapsed.as_millis() as u64;
        if seq < self.latest_applied {
            tracing::debug!(
                "dropping result for seq {seq}, seq {} already applied",
                self.latest_applied
            );
            self.summary.stale_dropped += 1;
            match &outcome {
                Ok(_) => self.summary.uploads_succeeded += 1,
                Err(_) => self.summary.uploads_failed += 1,
            }
            self.events.emit(PipelineEvent::StaleResultDropped {
                seq,
                latest_applied: self.latest_applied,
            });
            return;
        }
        self.latest_applied = seq;

        match outcome {
            Ok(result) => {
                self.summary.uploads_succeeded += 1;
                tracing::info!(
                    "seq {seq}: {} objects, {} findings in {elapsed_ms}ms",
                    result.object_count,
                    result.findings.len()
                );
                self.display.show_capture_status(&result.display_text());
                self.voice.store(result.voice_entry());
                self.events.emit(PipelineEvent::UploadCompleted {
                    seq,
                    object_count: result.object_count,
                    findings: result.findings.len(),
                    elapsed_ms,
                });
            }
            Err(failure) => {
                self.summary.uploads_failed += 1;
                tracing::warn!("seq {seq} upload failed: {failure}");
                let text = failure.to_string();
                self.display.show_capture_status(&text);
                self.events.emit(PipelineEvent::UploadFailed {
                    seq,
                    status: failure.status_code(),
                    error: text,
                    elapsed_ms,
                });
            }
        }
    }

    fn on_utterance(&self, text: &str) {
        let Some(phrase) = self.voice.on_utterance(text) else {
            tracing::trace!("utterance ignored: {text}");
            return;
        };
        let rate = self.prefs.tts_speed();
        self.speech.speak(&phrase, rate);
        self.events.emit(PipelineEvent::ReadoutSpoken { text: phrase, rate });
    }

    fn on_save_server_url(&self, raw: &str) {
        match self.prefs.save_server_base_url(raw) {
            Ok(url) => self
                .display
                .show_capture_status(&format!("Сервер сохранён: {url}")),
            Err(VisorError::InvalidEndpoint(_)) => {
                self.display.show_capture_status(INVALID_SERVER_TEXT)
            }
            Err(e) => {
                tracing::error!("failed to save server address: {e}");
                self.display.show_capture_status(&e.to_string());
            }
        }
    }

    fn show_placeholder(&mut self, index: u64, reason: &str, status: Option<&str>) {
        self.summary.placeholders += 1;
        let n = self.summary.placeholders;
        match placeholder_jpeg() {
            Ok(jpeg) => self.display.show_image(&jpeg),
            Err(e) => tracing::warn!("failed to render placeholder: {e}"),
        }
        let caption = format!("Camera Feed #{n}");
        self.display.show_capture_status(status.unwrap_or(&caption));
        self.events.emit(PipelineEvent::PlaceholderShown {
            index,
            reason: reason.to_string(),
        });
    }
}
