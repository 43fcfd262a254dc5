//! Main-sequence behaviour with fake camera, display, speech and analysis
//! collaborators, on a paused clock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use machinevisor::{
    AnalysisClient, AnalysisResult, Camera, CaptureError, CaptureRequest, CapturedFrame,
    Collaborators, Finding, Pipeline, PipelineEvent, PreferenceStore, SpeechOutput, StatusDisplay,
    UploadFailure, VisorConfig,
};

// ─────────────────────── fakes ───────────────────────

#[derive(Default)]
struct Screen {
    capture: Mutex<Vec<String>>,
}

impl Screen {
    fn last_capture_status(&self) -> Option<String> {
        self.capture.lock().unwrap().last().cloned()
    }
}

impl StatusDisplay for Screen {
    fn show_pose_status(&self, _text: &str) {}
    fn show_capture_status(&self, text: &str) {
        self.capture.lock().unwrap().push(text.to_string());
    }
    fn show_image(&self, _jpeg: &[u8]) {}
}

#[derive(Default)]
struct Voice {
    spoken: Mutex<Vec<String>>,
}

impl SpeechOutput for Voice {
    fn speak(&self, text: &str, _rate: f32) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Fails the captures whose 1-based call number is listed.
#[derive(Default)]
struct ScriptedCamera {
    calls: AtomicU32,
    fail_on: Vec<u32>,
}

#[async_trait]
impl Camera for ScriptedCamera {
    fn is_ready(&self) -> bool {
        true
    }

    async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(CaptureError::Hardware("lens cap on".to_string()));
        }
        Ok(CapturedFrame::from_bytes(vec![0xFF, 0xD8, 0xFF]))
    }
}

/// Answers each upload after a per-sequence delay; some sequences fail.
#[derive(Default)]
struct ScriptedServer {
    delays_ms: Vec<(u32, u64)>,
    fail_seq: Vec<u32>,
    seen: Mutex<Vec<u32>>,
}

#[async_trait]
impl AnalysisClient for ScriptedServer {
    async fn submit(&self, request: CaptureRequest) -> Result<AnalysisResult, UploadFailure> {
        let seq = request.sequence_number;
        self.seen.lock().unwrap().push(seq);

        let delay = self
            .delays_ms
            .iter()
            .find(|(s, _)| *s == seq)
            .map_or(10, |(_, d)| *d);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if self.fail_seq.contains(&seq) {
            return Err(UploadFailure::Status {
                code: 500,
                message: "Failed to process image".to_string(),
            });
        }
        Ok(AnalysisResult {
            object_count: seq.to_string(),
            findings: vec![Finding {
                class_name: "person".to_string(),
                localized_name: "человек".to_string(),
                location_descriptor: "слева сверху".to_string(),
                pixel_area: 100,
            }],
        })
    }
}

fn build(
    ticks: Option<u64>,
    camera: ScriptedCamera,
    server: Arc<ScriptedServer>,
) -> (Pipeline, Arc<Screen>, Arc<Voice>) {
    let screen = Arc::new(Screen::default());
    let voice = Arc::new(Voice::default());
    let pipeline = Pipeline::new(
        VisorConfig::default().with_tick_limit(ticks),
        Arc::new(PreferenceStore::default()),
        Collaborators {
            camera: Arc::new(camera),
            display: screen.clone(),
            speech: voice.clone(),
            client: server,
        },
    );
    (pipeline, screen, voice)
}

fn drain(rx: &mut broadcast::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_for(
    rx: &mut broadcast::Receiver<PipelineEvent>,
    pred: impl Fn(&PipelineEvent) -> bool,
) -> PipelineEvent {
    loop {
        let event = rx.recv().await.expect("event bus closed");
        if pred(&event) {
            return event;
        }
    }
}

// ─────────────────────── tests ───────────────────────

#[tokio::test(start_paused = true)]
async fn test_sequence_numbers_are_one_through_n() {
    let server = Arc::new(ScriptedServer::default());
    let (pipeline, _, _) = build(Some(4), ScriptedCamera::default(), server.clone());

    let summary = pipeline.run().await;

    let mut seen = server.seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4]);
    assert_eq!(summary.sequences_issued, 4);
    assert_eq!(summary.uploads_succeeded, 4);
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_does_not_block_later_ticks() {
    let server = Arc::new(ScriptedServer {
        fail_seq: vec![3],
        ..ScriptedServer::default()
    });
    let (pipeline, screen, _) = build(Some(5), ScriptedCamera::default(), server.clone());
    let mut events = pipeline.subscribe();

    let summary = pipeline.run().await;

    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.sequences_issued, 5);
    assert_eq!(summary.uploads_failed, 1);
    assert_eq!(summary.uploads_succeeded, 4);

    let events = drain(&mut events);
    let started: Vec<u32> = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::UploadStarted { .. }))
        .filter_map(PipelineEvent::seq)
        .collect();
    assert_eq!(started, vec![1, 2, 3, 4, 5]);
    assert!(events.iter().any(|e| matches!(
        e,
        PipelineEvent::UploadFailed { seq: 3, status: Some(500), .. }
    )));

    let capture = screen.capture.lock().unwrap();
    assert!(capture.contains(&"Upload failed: 500\nFailed to process image".to_string()));
    assert_eq!(capture.last().unwrap(), "Объектов: 5\n- человек: слева сверху");
}

#[tokio::test(start_paused = true)]
async fn test_failed_capture_consumes_sequence_number() {
    let camera = ScriptedCamera {
        fail_on: vec![2],
        ..ScriptedCamera::default()
    };
    let server = Arc::new(ScriptedServer::default());
    let (pipeline, screen, _) = build(Some(3), camera, server.clone());

    let summary = pipeline.run().await;

    assert_eq!(*server.seen.lock().unwrap(), vec![1, 3]);
    assert_eq!(summary.sequences_issued, 3);
    assert_eq!(summary.placeholders, 1);
    assert!(screen
        .capture
        .lock()
        .unwrap()
        .contains(&"Capture error: lens cap on".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_stale_completion_is_dropped() {
    // seq 1 answers after seq 2
    let server = Arc::new(ScriptedServer {
        delays_ms: vec![(1, 5000), (2, 100)],
        ..ScriptedServer::default()
    });
    let (pipeline, screen, _) = build(Some(2), ScriptedCamera::default(), server);
    let mut events = pipeline.subscribe();

    let summary = pipeline.run().await;

    assert_eq!(summary.stale_dropped, 1);
    assert_eq!(
        screen.last_capture_status().as_deref(),
        Some("Объектов: 2\n- человек: слева сверху")
    );
    assert!(drain(&mut events).contains(&PipelineEvent::StaleResultDropped {
        seq: 1,
        latest_applied: 2
    }));
}

#[tokio::test(start_paused = true)]
async fn test_voice_trigger_reads_latest_result() {
    let server = Arc::new(ScriptedServer::default());
    let (pipeline, _, voice) = build(None, ScriptedCamera::default(), server);
    let handle = pipeline.handle();
    let mut events = pipeline.subscribe();

    // nothing cached yet
    handle.utterance("чек");
    let run = tokio::spawn(pipeline.run());

    wait_for(&mut events, |e| matches!(e, PipelineEvent::UploadCompleted { .. })).await;
    assert!(voice.spoken.lock().unwrap().is_empty());

    handle.utterance("Давай ПОСМОТРЕТЬ что там");
    let spoken = wait_for(&mut events, |e| matches!(e, PipelineEvent::ReadoutSpoken { .. })).await;
    assert_eq!(
        spoken,
        PipelineEvent::ReadoutSpoken {
            text: "Объектов: 1. - человек: слева сверху".to_string(),
            rate: 1.0,
        }
    );

    handle.utterance("привет");
    handle.shutdown();
    run.await.unwrap();
    assert_eq!(voice.spoken.lock().unwrap().len(), 1);
}
