//! Attendance sink implementations

use engagement::ReportEvent;
use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{AttendancePayload, SyncError};

/// Destination for engagement reports
pub trait AttendanceSink: Send + Sync + 'static {
    /// Deliver one report. Called on a detached task; never retried.
    fn report(&self, event: ReportEvent) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Upper bound on one HTTP report, matching the default reporting interval
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

/// Pending MQTT publishes held while the broker is unreachable
pub const MQTT_QUEUE_CAPACITY: usize = 10;

fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

/// Sink selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// POST to `{base_url}/api/attendance`
    Http {
        base_url: String,
        #[serde(default = "default_http_timeout_ms")]
        timeout_ms: u64,
    },
    /// Publish to `classes/{classCode}/attendance`
    Mqtt {
        broker_url: String,
        broker_port: u16,
        client_id: String,
    },
    /// Log reports only
    Log,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Http {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

/// HTTP attendance sink
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    /// Every request, connect included, is abandoned after `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/attendance", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AttendanceSink for HttpSink {
    async fn report(&self, event: ReportEvent) -> Result<(), SyncError> {
        let payload = AttendancePayload::from(&event);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }

        debug!("Attendance posted for {} ({})", payload.student_name, status);
        Ok(())
    }
}

/// MQTT attendance sink
pub struct MqttSink {
    client: AsyncClient,
    event_loop: JoinHandle<()>,
}

impl MqttSink {
    /// Create the client and spawn its event loop. Must run inside a Tokio runtime.
    pub fn connect(broker_url: &str, broker_port: u16, client_id: &str) -> Self {
        let mut options = MqttOptions::new(client_id, broker_url, broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, MQTT_QUEUE_CAPACITY);

        let event_loop = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    _ => {}
                }
            }
        });

        info!("MQTT attendance sink using broker {}:{}", broker_url, broker_port);
        Self { client, event_loop }
    }

    pub fn topic(class_code: &str) -> String {
        format!("classes/{}/attendance", class_code)
    }
}

impl AttendanceSink for MqttSink {
    /// Queues the publish for the event loop. Fails at once when the
    /// queue is full instead of waiting for the broker to come back.
    async fn report(&self, event: ReportEvent) -> Result<(), SyncError> {
        let payload = AttendancePayload::from(&event);
        let body = serde_json::to_vec(&payload)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        self.client
            .try_publish(Self::topic(&payload.class_code), QoS::AtLeastOnce, false, body)
            .map_err(|e| SyncError::Publish(e.to_string()))
    }
}

impl Drop for MqttSink {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AttendanceSink for LogSink {
    async fn report(&self, event: ReportEvent) -> Result<(), SyncError> {
        let payload = serde_json::to_string(&AttendancePayload::from(&event))
            .map_err(|e| SyncError::Serialization(e.to_string()))?;
        info!(target: "attendance", "{}", payload);
        Ok(())
    }
}

/// Sink chosen from configuration
pub enum ConfiguredSink {
    Http(HttpSink),
    Mqtt(MqttSink),
    Log(LogSink),
}

impl ConfiguredSink {
    /// Build the configured sink. Must run inside a Tokio runtime.
    pub fn connect(config: &SinkConfig) -> Result<Self, SyncError> {
        match config {
            SinkConfig::Http { base_url, timeout_ms } => {
                let sink = HttpSink::new(base_url, Duration::from_millis(*timeout_ms))?;
                info!("HTTP attendance sink posting to {}", sink.endpoint());
                Ok(Self::Http(sink))
            }
            SinkConfig::Mqtt {
                broker_url,
                broker_port,
                client_id,
            } => Ok(Self::Mqtt(MqttSink::connect(broker_url, *broker_port, client_id))),
            SinkConfig::Log => Ok(Self::Log(LogSink)),
        }
    }
}

impl AttendanceSink for ConfiguredSink {
    async fn report(&self, event: ReportEvent) -> Result<(), SyncError> {
        match self {
            Self::Http(sink) => sink.report(event).await,
            Self::Mqtt(sink) => sink.report(event).await,
            Self::Log(sink) => sink.report(event).await,
        }
    }
}
