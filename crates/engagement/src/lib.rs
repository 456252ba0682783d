//! Engagement Scoring Engine
//!
//! Per-subject engagement analysis from facial landmarks:
//! - Eye aspect ratio (EAR) from six landmarks per eye
//! - Consecutive-frame debounce for sleepy and distracted states
//! - Time-gated score with bounded penalty and recovery
//! - Report snapshots for the attendance sink

pub mod analysis;
pub mod config;
pub mod landmarks;
pub mod openness;
pub mod score;
pub mod session;
pub mod state;

pub use analysis::{EngagementAlert, FrameAnalysis};
pub use config::{EngagementConfig, RecoveryAnchor};
pub use landmarks::{EyeLandmarkSet, LandmarkFrame, Point};
pub use openness::{eye_aspect_ratio, EyeOpenness, OpennessExtractor, OpennessSample};
pub use score::{EngagementScore, ScoreChange};
pub use session::{EngagementSession, EngagementSnapshot, ReportEvent, SessionIdentity};
pub use state::{FocusFlags, HysteresisState};

use thiserror::Error;

/// Engagement error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngagementError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid session identity: {0} must not be empty")]
    InvalidIdentity(&'static str),
}
