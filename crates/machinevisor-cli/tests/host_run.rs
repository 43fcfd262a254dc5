//! Host devices driving the pipeline end to end, with a fake analysis
//! service.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use machinevisor::{
    AnalysisClient, AnalysisResult, CaptureRequest, Collaborators, Pipeline, PipelineEvent,
    PreferenceStore, SpeechOutput, StatusDisplay, UploadFailure, VisorConfig,
};
use machinevisor_cli::devices::{parse_sensor_lines, DirectoryCamera, SensorReplay};
use machinevisor_cli::input::forward_lines;

// ─────────────────────── helpers ───────────────────────

#[derive(Default)]
struct Screen {
    pose: Mutex<Vec<String>>,
    capture: Mutex<Vec<String>>,
}

impl StatusDisplay for Screen {
    fn show_pose_status(&self, text: &str) {
        self.pose.lock().unwrap().push(text.to_string());
    }
    fn show_capture_status(&self, text: &str) {
        self.capture.lock().unwrap().push(text.to_string());
    }
    fn show_image(&self, _jpeg: &[u8]) {}
}

#[derive(Default)]
struct Speaker {
    spoken: Mutex<Vec<(String, f32)>>,
}

impl SpeechOutput for Speaker {
    fn speak(&self, text: &str, rate: f32) {
        self.spoken.lock().unwrap().push((text.to_string(), rate));
    }
}

/// Records the size of every uploaded frame.
#[derive(Default)]
struct Analyzer {
    sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl AnalysisClient for Analyzer {
    async fn submit(&self, request: CaptureRequest) -> Result<AnalysisResult, UploadFailure> {
        self.sizes.lock().unwrap().push(request.frame.bytes.len());
        Ok(machinevisor::interpret(&serde_json::json!({
            "object_count": 1,
            "objects": [{"class": "chair", "grid_positions": "middle center", "width": 3, "height": 4}]
        })))
    }
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn test_directory_camera_frames_are_uploaded_and_released() {
    let images = tempfile::tempdir().unwrap();
    std::fs::write(images.path().join("01.jpg"), vec![7u8; 10]).unwrap();
    std::fs::write(images.path().join("02.jpg"), vec![7u8; 20]).unwrap();
    let scratch = tempfile::tempdir().unwrap();

    let analyzer = Arc::new(Analyzer::default());
    let screen = Arc::new(Screen::default());
    let pipeline = Pipeline::new(
        VisorConfig::default()
            .with_capture_interval(Duration::from_millis(20))
            .with_tick_limit(Some(3)),
        Arc::new(PreferenceStore::default()),
        Collaborators {
            camera: Arc::new(
                DirectoryCamera::open(images.path())
                    .unwrap()
                    .with_scratch_dir(scratch.path()),
            ),
            display: screen.clone(),
            speech: Arc::new(Speaker::default()),
            client: analyzer.clone(),
        },
    );

    let summary = pipeline.run().await;

    assert_eq!(summary.uploads_succeeded, 3);
    let mut sizes = analyzer.sizes.lock().unwrap().clone();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![10, 10, 20]);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    assert!(screen
        .capture
        .lock()
        .unwrap()
        .contains(&"Объектов: 1\n- стул: средняя центр".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_sensor_replay_and_stdin_commands() {
    let speaker = Arc::new(Speaker::default());
    let screen = Arc::new(Screen::default());
    let prefs = Arc::new(PreferenceStore::default());
    prefs.set_tts_speed(0.5).unwrap();

    let pipeline = Pipeline::new(
        VisorConfig::default(),
        Arc::clone(&prefs),
        Collaborators {
            camera: Arc::new(DirectoryCamera::unavailable()),
            display: screen.clone(),
            speech: speaker.clone(),
            client: Arc::new(Analyzer::default()),
        },
    );
    let handle = pipeline.handle();
    let mut events = pipeline.subscribe();

    let records = parse_sensor_lines(
        "inline",
        "{\"accel\": [0.0, 9.2, 3.3]}\n{\"unavailable\": \"Gyroscope\"}\n",
    )
    .unwrap();
    let replay = SensorReplay::new(records, Duration::from_millis(10)).spawn(handle.clone());
    let run = tokio::spawn(pipeline.run());

    assert_eq!(replay.await.unwrap(), 2);

    let script = "чек\n:server 10.0.0.7:9000\n:voice-test\n";
    let delivered = forward_lines(Cursor::new(script), &handle).unwrap();
    assert_eq!(delivered, 3);

    loop {
        if let PipelineEvent::PlaceholderShown { index, .. } = events.recv().await.unwrap() {
            if index >= 2 {
                break;
            }
        }
    }
    forward_lines(Cursor::new(":quit\n"), &handle).unwrap();
    let summary = run.await.unwrap();

    assert!(summary.placeholders >= 2);
    assert_eq!(summary.sequences_issued, 0);
    assert_eq!(prefs.server_base_url().as_deref(), Some("http://10.0.0.7:9000/"));
    assert_eq!(
        *speaker.spoken.lock().unwrap(),
        vec![(machinevisor::voice::VOICE_TEST_PHRASE.to_string(), 0.5)]
    );

    let pose = screen.pose.lock().unwrap();
    assert!(pose.iter().any(|t| t.starts_with("Pitch ")));
    assert!(pose.contains(&"Gyroscope not available".to_string()));
}
