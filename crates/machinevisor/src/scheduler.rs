//! Fixed-period capture scheduler.
//!
//! Ticks fire unconditionally, the first one immediately, and are handed
//! to the main sequence over an unbounded channel so the timer task never
//! waits on capture or upload work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// One scheduler firing. `index` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub index: u64,
    pub fired_at: Instant,
}

/// Scheduler settings.
#[derive(Debug, Clone, Copy)]
pub struct CaptureScheduler {
    pub interval: Duration,
    pub limit: Option<u64>,
}

impl CaptureScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Start ticking into `ticks`. The channel closes when the scheduler
    /// stops (limit reached, shutdown, or receiver gone).
    pub fn spawn(self, ticks: mpsc::UnboundedSender<Tick>) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let stop = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            tracing::info!(
                "capture scheduler started: every {}ms, limit={:?}",
                self.interval.as_millis(),
                self.limit
            );
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut index: u64 = 0;

            loop {
                if self.limit.is_some_and(|limit| index >= limit) {
                    tracing::debug!("capture scheduler reached its limit of {index} ticks");
                    break;
                }
                tokio::select! {
                    _ = stop.notified() => {
                        tracing::info!("capture scheduler stopping");
                        break;
                    }
                    fired_at = ticker.tick() => {
                        index += 1;
                        if ticks.send(Tick { index, fired_at }).is_err() {
                            tracing::debug!("tick receiver gone, scheduler exiting");
                            break;
                        }
                    }
                }
            }
        });

        SchedulerHandle { handle, shutdown }
    }
}

/// Running scheduler.
pub struct SchedulerHandle {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
}

impl SchedulerHandle {
    /// Stop ticking and wait for the timer task to exit.
    pub async fn stop(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.handle.await {
            tracing::warn!("capture scheduler task failed to join: {e}");
        }
    }
}
