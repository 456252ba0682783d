//! Sleepy / distracted debounce state

use serde::{Deserialize, Serialize};

use crate::openness::OpennessSample;
use crate::EngagementConfig;

/// Debounced focus flags for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FocusFlags {
    pub is_sleepy: bool,
    pub is_distracted: bool,
}

impl FocusFlags {
    /// Either flag set
    pub fn is_penalized(&self) -> bool {
        self.is_sleepy || self.is_distracted
    }
}

/// Consecutive-run counters (tracked per session).
///
/// Counters are run lengths, not totals: any frame that does not match
/// resets them to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HysteresisState {
    /// Consecutive frames with eyes closed
    pub closed_eye_frames: u32,

    /// Consecutive frames without a face
    pub no_face_frames: u32,

    flags: FocusFlags,
}

impl HysteresisState {
    /// Update from a frame with a face
    pub fn observe_face(&mut self, sample: OpennessSample, config: &EngagementConfig) -> FocusFlags {
        self.no_face_frames = 0;

        if sample.is_closed(config.ear_threshold) {
            self.closed_eye_frames = self.closed_eye_frames.saturating_add(1);
        } else {
            self.closed_eye_frames = 0;
        }

        self.flags = FocusFlags {
            is_sleepy: self.closed_eye_frames > config.sleepy_frames,
            is_distracted: false,
        };
        self.flags
    }

    /// Update from a frame without a face
    pub fn observe_no_face(&mut self, config: &EngagementConfig) -> FocusFlags {
        self.no_face_frames = self.no_face_frames.saturating_add(1);
        self.closed_eye_frames = 0;

        self.flags = FocusFlags {
            is_sleepy: false,
            is_distracted: self.no_face_frames > config.distracted_frames,
        };
        self.flags
    }

    /// Update from an optional sample (`None` = no face)
    pub fn observe(&mut self, sample: Option<OpennessSample>, config: &EngagementConfig) -> FocusFlags {
        match sample {
            Some(sample) => self.observe_face(sample, config),
            None => self.observe_no_face(config),
        }
    }

    /// Flags computed by the most recent frame
    pub fn flags(&self) -> FocusFlags {
        self.flags
    }

    /// Reset state (on session start)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
