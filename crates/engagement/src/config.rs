//! Engagement configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::landmarks::EyeLandmarkSet;
use crate::EngagementError;

/// Which instant the recovery interval is measured from after a penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAnchor {
    /// Restart the recovery interval on the first focused frame after a penalized one
    #[default]
    FocusStart,
    /// Keep measuring from the last recovery point, even across penalties
    LastRecovery,
}

/// Engagement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Mean EAR below which eyes count as closed
    pub ear_threshold: f64,

    /// Closed-eye run length that must be exceeded to flag sleepy (frames)
    pub sleepy_frames: u32,

    /// No-face run length that must be exceeded to flag distracted (frames)
    pub distracted_frames: u32,

    /// Minimum time between two penalties (milliseconds)
    pub penalty_interval_ms: u64,

    /// Points removed per penalty
    pub penalty_points: f64,

    /// Minimum time between two recoveries (milliseconds)
    pub recovery_interval_ms: u64,

    /// Points added per recovery
    pub recovery_points: f64,

    /// Score floor
    pub min_score: f64,

    /// Score ceiling, also the starting score
    pub max_score: f64,

    /// Recovery timer behaviour after a penalty
    pub recovery_anchor: RecoveryAnchor,

    /// Eye landmark indices
    pub left_eye: EyeLandmarkSet,
    pub right_eye: EyeLandmarkSet,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.21,
            sleepy_frames: 12,
            distracted_frames: 10,
            penalty_interval_ms: 2000,
            penalty_points: 1.0,
            recovery_interval_ms: 2000,
            recovery_points: 1.0,
            min_score: 0.0,
            max_score: 100.0,
            recovery_anchor: RecoveryAnchor::default(),
            left_eye: EyeLandmarkSet::LEFT,
            right_eye: EyeLandmarkSet::RIGHT,
        }
    }
}

impl EngagementConfig {
    /// Create strict config (shorter debounce, faster penalties)
    pub fn strict() -> Self {
        Self {
            sleepy_frames: 8,
            distracted_frames: 6,
            penalty_interval_ms: 1000,
            recovery_interval_ms: 3000,
            ..Default::default()
        }
    }

    /// Create lenient config (longer debounce, slower penalties)
    pub fn lenient() -> Self {
        Self {
            sleepy_frames: 20,
            distracted_frames: 30,
            penalty_interval_ms: 4000,
            recovery_interval_ms: 1000,
            ..Default::default()
        }
    }

    pub fn penalty_interval(&self) -> Duration {
        Duration::from_millis(self.penalty_interval_ms)
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_millis(self.recovery_interval_ms)
    }

    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), EngagementError> {
        if !(self.ear_threshold.is_finite() && self.ear_threshold > 0.0) {
            return Err(EngagementError::Config(format!(
                "ear_threshold must be positive, got {}",
                self.ear_threshold
            )));
        }
        if !(self.min_score.is_finite() && self.max_score.is_finite()) || self.min_score >= self.max_score {
            return Err(EngagementError::Config(format!(
                "score range [{}, {}] is empty",
                self.min_score, self.max_score
            )));
        }
        if self.min_score < 0.0 {
            return Err(EngagementError::Config(format!(
                "min_score must not be negative, got {}",
                self.min_score
            )));
        }
        if self.penalty_interval_ms == 0 || self.recovery_interval_ms == 0 {
            return Err(EngagementError::Config(
                "penalty and recovery intervals must be non-zero".to_string(),
            ));
        }
        if !(self.penalty_points > 0.0 && self.recovery_points > 0.0) {
            return Err(EngagementError::Config(
                "penalty and recovery points must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let config = EngagementConfig::default();
        assert_eq!(config.ear_threshold, 0.21);
        assert_eq!(config.sleepy_frames, 12);
        assert_eq!(config.distracted_frames, 10);
        assert_eq!(config.penalty_interval(), Duration::from_millis(2000));
        assert_eq!(config.recovery_interval(), Duration::from_millis(2000));
        assert_eq!(config.max_score, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(EngagementConfig::strict().validate().is_ok());
        assert!(EngagementConfig::lenient().validate().is_ok());
        assert!(EngagementConfig::strict().sleepy_frames < EngagementConfig::lenient().sleepy_frames);
    }

    #[test]
    fn test_rejects_empty_score_range() {
        let config = EngagementConfig {
            min_score: 50.0,
            max_score: 50.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngagementError::Config(_))));
    }

    #[test]
    fn test_rejects_negative_floor() {
        let config = EngagementConfig {
            min_score: -10.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngagementError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_interval_and_bad_threshold() {
        let config = EngagementConfig {
            penalty_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngagementConfig {
            ear_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: EngagementConfig =
            serde_json::from_str(r#"{"sleepy_frames": 5, "recovery_anchor": "last_recovery"}"#).unwrap();
        assert_eq!(config.sleepy_frames, 5);
        assert_eq!(config.recovery_anchor, RecoveryAnchor::LastRecovery);
        assert_eq!(config.distracted_frames, 10);
        assert_eq!(config.left_eye, EyeLandmarkSet::LEFT);
    }
}
