//! Report Scheduler Implementation

use attendance_sync::AttendanceSink;
use chrono::Utc;
use engagement::{EngagementError, EngagementSession};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Session state shared by the frame path, the scheduler, and status readers
pub type SharedSession = Arc<RwLock<EngagementSession>>;

/// Configuration for the report scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Time between reports in milliseconds (default: 5000)
    pub interval_ms: u64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self { interval_ms: 5000 }
    }
}

impl ReportingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), EngagementError> {
        if self.interval_ms == 0 {
            return Err(EngagementError::Config(
                "reporting interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Periodic reporter for one session
pub struct ReportScheduler<S> {
    config: ReportingConfig,
    session: SharedSession,
    sink: Arc<S>,
    /// Reports handed to the sink
    dispatched: AtomicU64,
}

impl<S: AttendanceSink> ReportScheduler<S> {
    pub fn new(config: ReportingConfig, session: SharedSession, sink: Arc<S>) -> Self {
        Self {
            config,
            session,
            sink,
            dispatched: AtomicU64::new(0),
        }
    }

    /// Take one snapshot and dispatch it.
    ///
    /// Returns the delivery task, or `None` if no session is active.
    /// Delivery errors are logged by the task and never reach the session.
    pub async fn tick(&self) -> Option<JoinHandle<()>> {
        let event = {
            let session = self.session.read().await;
            session.report_event(Utc::now())
        };

        let Some(event) = event else {
            debug!("Report tick skipped: no active session");
            return None;
        };

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Reporting {} in {}: score {:.1}, sleepy {}, distracted {}",
            event.subject_id, event.class_id, event.score, event.is_sleepy, event.is_distracted
        );

        let sink = Arc::clone(&self.sink);
        Some(tokio::spawn(async move {
            let student = event.subject_id.clone();
            match sink.report(event).await {
                Ok(()) => {
                    metrics::counter!("attendance_reports_total", "outcome" => "ok").increment(1);
                }
                Err(e) => {
                    metrics::counter!("attendance_reports_total", "outcome" => "error").increment(1);
                    warn!("Attendance report for {} failed: {}", student, e);
                }
            }
        }))
    }

    /// Run until `shutdown` turns true or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if let Err(e) = self.config.validate() {
            error!("Report scheduler not started: {}", e);
            return;
        }
        let period = self.config.interval();
        info!("Starting report scheduler every {:?}", period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Report scheduler stopped");
    }

    /// Number of reports handed to the sink so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}
