//! Motion sensor replay from a JSON-lines recording.
//!
//! Each line is one record:
//!
//! ```text
//! {"accel": [0.1, 9.2, 3.3]}
//! {"gyro": [0.0, 0.01, 0.0]}
//! {"unavailable": "Gyroscope"}
//! {"unreliable": "Accelerometer"}
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use machinevisor::{PipelineHandle, SensorEvent, SensorKind, Vector3};

use crate::error::{HostError, HostResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorRecord {
    Accel(Vector3),
    Gyro(Vector3),
    Unavailable(SensorKind),
    Unreliable(SensorKind),
}

impl From<SensorRecord> for SensorEvent {
    fn from(record: SensorRecord) -> Self {
        match record {
            SensorRecord::Accel(v) => SensorEvent::Accel(v),
            SensorRecord::Gyro(v) => SensorEvent::Gyro(v),
            SensorRecord::Unavailable(kind) => SensorEvent::Unavailable(kind),
            SensorRecord::Unreliable(kind) => SensorEvent::Unreliable(kind),
        }
    }
}

/// Parse a recording. Blank lines and `#` comments are skipped.
pub fn parse_sensor_lines(source: &str, text: &str) -> HostResult<Vec<SensorRecord>> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|e| HostError::SensorRecord {
            path: source.to_string(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_sensor_file(path: impl AsRef<Path>) -> HostResult<Vec<SensorRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_sensor_lines(&path.display().to_string(), &text)
}

/// Feeds recorded samples into a running pipeline at a fixed rate.
pub struct SensorReplay {
    records: Vec<SensorRecord>,
    period: Duration,
    looped: bool,
}

impl SensorReplay {
    pub fn new(records: Vec<SensorRecord>, period: Duration) -> Self {
        Self {
            records,
            period,
            looped: false,
        }
    }

    /// Start over from the first record after the last one.
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    /// Replay in the background until the records run out or the
    /// pipeline stops accepting input.
    pub fn spawn(self, handle: PipelineHandle) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut sent = 0usize;
            if self.records.is_empty() {
                return sent;
            }
            let mut ticker = tokio::time::interval(self.period);
            loop {
                for record in &self.records {
                    ticker.tick().await;
                    if !handle.sensor(record.clone().into()) {
                        tracing::debug!("Pipeline stopped, sensor replay ends after {sent} samples");
                        return sent;
                    }
                    sent += 1;
                }
                if !self.looped {
                    tracing::debug!("Sensor replay finished: {sent} samples");
                    return sent;
                }
            }
        })
    }
}
