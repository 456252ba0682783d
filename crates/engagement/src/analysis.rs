//! Per-frame analysis results and alerts

use serde::{Deserialize, Serialize};

use crate::openness::EyeOpenness;
use crate::score::ScoreChange;
use crate::state::FocusFlags;

/// Engagement alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementAlert {
    /// Eyes closed longer than the sleepy debounce
    Sleepy,

    /// Face missing longer than the distraction debounce
    Distracted,
}

/// Result of processing one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Whether a face was present
    pub face_detected: bool,

    /// Eye openness (if a face was present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openness: Option<EyeOpenness>,

    /// Debounced flags for this frame
    pub flags: FocusFlags,

    /// Current run lengths
    pub closed_eye_frames: u32,
    pub no_face_frames: u32,

    /// Score after this frame
    pub score: f64,

    /// What this frame did to the score
    pub score_change: ScoreChange,

    /// Active alerts
    pub alerts: Vec<EngagementAlert>,
}

impl FrameAnalysis {
    /// Check if any alerts are active
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Get highest severity alert
    pub fn highest_severity_alert(&self) -> Option<EngagementAlert> {
        // Priority: Sleepy > Distracted
        if self.alerts.contains(&EngagementAlert::Sleepy) {
            Some(EngagementAlert::Sleepy)
        } else {
            self.alerts.first().copied()
        }
    }
}

pub(crate) fn alerts_for(flags: FocusFlags) -> Vec<EngagementAlert> {
    let mut alerts = Vec::new();
    if flags.is_sleepy {
        alerts.push(EngagementAlert::Sleepy);
    }
    if flags.is_distracted {
        alerts.push(EngagementAlert::Distracted);
    }
    alerts
}
