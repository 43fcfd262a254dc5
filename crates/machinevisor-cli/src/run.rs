//! `machinevisor run`: the pipeline wired to console and file devices.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use machinevisor::{
    Collaborators, Pipeline, PipelineEvent, PreferenceStore, RunSummary, SensorEvent, SensorKind,
    Uploader, VisorConfig,
};

use crate::devices::{load_sensor_file, ConsoleDisplay, ConsoleSpeech, DirectoryCamera, SensorReplay};
use crate::error::HostResult;
use crate::input::spawn_stdin_reader;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory of JPEGs served as camera frames. `None` leaves the
    /// camera unavailable.
    pub images: Option<PathBuf>,
    /// JSON-lines motion recording.
    pub sensors: Option<PathBuf>,
    pub sensor_period: Duration,
    pub loop_sensors: bool,
    pub ticks: Option<u64>,
    pub interval: Option<Duration>,
    pub details: bool,
    pub frame_out: Option<PathBuf>,
    /// Read utterances and commands from stdin.
    pub stdin: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            images: None,
            sensors: None,
            sensor_period: Duration::from_millis(100),
            loop_sensors: false,
            ticks: None,
            interval: None,
            details: false,
            frame_out: None,
            stdin: true,
        }
    }
}

impl RunOptions {
    pub fn config(&self) -> VisorConfig {
        let mut config = VisorConfig::from_env().with_tick_limit(self.ticks);
        if let Some(interval) = self.interval {
            config = config.with_capture_interval(interval);
        }
        config.details = self.details;
        config
    }
}

/// Run the pipeline until the tick limit, `:quit`, or Ctrl-C.
pub async fn run_pipeline(options: RunOptions, prefs: Arc<PreferenceStore>) -> HostResult<RunSummary> {
    let config = options.config();

    let camera = match &options.images {
        Some(dir) => DirectoryCamera::open(dir)?,
        None => {
            tracing::warn!("No --images directory, showing placeholders");
            DirectoryCamera::unavailable()
        }
    };
    let sensors = options.sensors.as_ref().map(load_sensor_file).transpose()?;

    let client = Uploader::new(Arc::clone(&prefs), config.request_timeout);
    match client.base_url() {
        Ok(base) => tracing::info!("Server: {base}"),
        Err(e) => tracing::warn!("Server address unusable: {e}"),
    }

    let pipeline = Pipeline::new(
        config,
        Arc::clone(&prefs),
        Collaborators {
            camera: Arc::new(camera),
            display: Arc::new(ConsoleDisplay::new(options.frame_out.clone())),
            speech: Arc::new(ConsoleSpeech::new(prefs.tts_voice())),
            client: Arc::new(client),
        },
    );
    let handle = pipeline.handle();

    let mut events = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                tracing::debug!(target: "machinevisor::events", "{json}");
            }
            if matches!(event, PipelineEvent::Stopped { .. }) {
                break;
            }
        }
    });

    match sensors {
        Some(records) => {
            tracing::info!("Replaying {} sensor records", records.len());
            SensorReplay::new(records, options.sensor_period)
                .looped(options.loop_sensors)
                .spawn(handle.clone());
        }
        None => {
            handle.sensor(SensorEvent::Unavailable(SensorKind::Accelerometer));
            handle.sensor(SensorEvent::Unavailable(SensorKind::Gyroscope));
        }
    }

    if options.stdin {
        spawn_stdin_reader(handle.clone())?;
    }

    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            ctrl_c.shutdown();
        }
    });

    Ok(pipeline.run().await)
}
