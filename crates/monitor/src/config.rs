//! Monitor configuration
//!
//! Layered: serde defaults, then an optional config file, then
//! `CLASSROOM__*` environment variables (`__` separates nested keys,
//! e.g. `CLASSROOM__ENGAGEMENT__SLEEPY_FRAMES=15`).

use attendance_sync::SinkConfig;
use engagement::{EngagementConfig, SessionIdentity};
use report_scheduler::ReportingConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::MonitorError;

/// Default config file name (extension picked by the `config` crate)
pub const DEFAULT_CONFIG_FILE: &str = "classroom-monitor";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Student and class to monitor from startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub student_name: String,
    pub class_code: String,
}

impl IdentityConfig {
    pub fn to_identity(&self) -> Result<SessionIdentity, MonitorError> {
        Ok(SessionIdentity::new(&self.student_name, &self.class_code)?)
    }
}

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub engagement: EngagementConfig,
    pub reporting: ReportingConfig,
    pub sink: SinkConfig,

    /// Start monitoring immediately; otherwise wait for the start endpoint
    pub identity: Option<IdentityConfig>,

    /// Status API bind address
    pub api_addr: String,

    /// Landmark frames as JSON lines; stdin when unset
    pub frames_path: Option<PathBuf>,

    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            engagement: EngagementConfig::default(),
            reporting: ReportingConfig::default(),
            sink: SinkConfig::default(),
            identity: None,
            api_addr: "0.0.0.0:8080".to_string(),
            frames_path: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl MonitorConfig {
    /// Load from `path` (or the default file, if present) and the environment
    pub fn load(path: Option<&str>) -> Result<Self, MonitorError> {
        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("CLASSROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| MonitorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.engagement.validate()?;
        self.reporting.validate()?;
        self.api_addr
            .parse::<SocketAddr>()
            .map_err(|e| MonitorError::Config(format!("api_addr {}: {}", self.api_addr, e)))?;
        if let Some(identity) = &self.identity {
            identity.to_identity()?;
        }
        Ok(())
    }
}
