//! Pipeline tuning, with environment overrides.

use std::time::Duration;

const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 2000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Runtime settings for one pipeline instance.
#[derive(Debug, Clone)]
pub struct VisorConfig {
    /// Period of the capture scheduler.
    pub capture_interval: Duration,
    /// Stop after this many ticks (`None` runs until shutdown).
    pub tick_limit: Option<u64>,
    /// Per-request timeout for uploads.
    pub request_timeout: Duration,
    /// Value of the `details` upload field.
    pub details: bool,
    /// Buffer size of the pipeline event bus.
    pub event_capacity: usize,
}

impl Default for VisorConfig {
    fn default() -> Self {
        Self {
            capture_interval: Duration::from_millis(DEFAULT_CAPTURE_INTERVAL_MS),
            tick_limit: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            details: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl VisorConfig {
    /// Defaults overridden by `MACHINEVISOR_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capture_interval: Duration::from_millis(
                read_env_u64("MACHINEVISOR_CAPTURE_INTERVAL_MS", DEFAULT_CAPTURE_INTERVAL_MS)
                    .max(1),
            ),
            request_timeout: Duration::from_millis(
                read_env_u64("MACHINEVISOR_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)
                    .max(1),
            ),
            ..defaults
        }
    }

    pub fn with_capture_interval(mut self, interval: Duration) -> Self {
        self.capture_interval = interval;
        self
    }

    pub fn with_tick_limit(mut self, limit: Option<u64>) -> Self {
        self.tick_limit = limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn read_env_u64(name: &str, default_value: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_value)
}
