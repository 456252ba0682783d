//! Attendance Synchronization Module
//!
//! Delivers engagement reports to the attendance backend:
//! - HTTP POST to `/api/attendance`
//! - MQTT publish per class topic
//! - Log-only sink for offline runs
//!
//! Reports are best-effort. A failed delivery is returned to the caller,
//! which logs it; nothing is retried.

mod sink;

pub use sink::{
    AttendanceSink, ConfiguredSink, HttpSink, LogSink, MqttSink, SinkConfig, DEFAULT_HTTP_TIMEOUT_MS,
    MQTT_QUEUE_CAPACITY,
};

use engagement::ReportEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attendance sync error types
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Backend rejected report with status {0}")]
    Status(u16),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Wire body accepted by the attendance backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayload {
    pub class_code: String,
    pub student_name: String,
    pub engagement: f64,
    pub sleepy: bool,
    pub distracted: bool,
}

impl From<&ReportEvent> for AttendancePayload {
    fn from(event: &ReportEvent) -> Self {
        Self {
            class_code: event.class_id.clone(),
            student_name: event.subject_id.clone(),
            engagement: event.score,
            sleepy: event.is_sleepy,
            distracted: event.is_distracted,
        }
    }
}
