//! Monitoring session: owns all per-subject engagement state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::{alerts_for, FrameAnalysis};
use crate::landmarks::LandmarkFrame;
use crate::openness::OpennessExtractor;
use crate::score::{EngagementScore, ScoreChange};
use crate::state::{FocusFlags, HysteresisState};
use crate::{EngagementConfig, EngagementError};

/// Who is being monitored, and in which class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    student_name: String,
    class_code: String,
}

impl SessionIdentity {
    /// Both values are trimmed and must be non-empty
    pub fn new(student_name: &str, class_code: &str) -> Result<Self, EngagementError> {
        let student_name = student_name.trim();
        let class_code = class_code.trim();

        if student_name.is_empty() {
            return Err(EngagementError::InvalidIdentity("student name"));
        }
        if class_code.is_empty() {
            return Err(EngagementError::InvalidIdentity("class code"));
        }

        Ok(Self {
            student_name: student_name.to_string(),
            class_code: class_code.to_string(),
        })
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn class_code(&self) -> &str {
        &self.class_code
    }
}

/// Snapshot handed to the attendance sink at each reporting tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvent {
    pub subject_id: String,
    pub class_id: String,
    pub score: f64,
    pub is_sleepy: bool,
    pub is_distracted: bool,
    pub timestamp: DateTime<Utc>,
}

/// Live view of a session for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct EngagementSnapshot {
    pub session_id: Uuid,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
    pub score: f64,
    /// Score rounded for display
    pub display_score: u32,
    pub is_sleepy: bool,
    pub is_distracted: bool,
    pub frames_processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame_at: Option<DateTime<Utc>>,
}

/// Engagement session.
///
/// Single writer: frames are processed one at a time through `&mut self`.
/// Callers sharing a session across tasks wrap it in one lock.
pub struct EngagementSession {
    id: Uuid,
    config: EngagementConfig,
    extractor: OpennessExtractor,
    hysteresis: HysteresisState,
    score: EngagementScore,
    identity: Option<SessionIdentity>,
    frames_processed: u64,
    last_frame_at: Option<DateTime<Utc>>,
}

impl EngagementSession {
    /// Create an idle session (no identity, reporting disabled)
    pub fn new(config: EngagementConfig) -> Result<Self, EngagementError> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            extractor: OpennessExtractor::new(&config),
            hysteresis: HysteresisState::default(),
            score: EngagementScore::new(&config, Instant::now()),
            identity: None,
            frames_processed: 0,
            last_frame_at: None,
            config,
        })
    }

    /// Start monitoring `identity` now
    pub fn start(&mut self, identity: SessionIdentity) {
        self.start_at(identity, Instant::now());
    }

    /// Start monitoring with both score timers at `now`
    pub fn start_at(&mut self, identity: SessionIdentity, now: Instant) {
        self.id = Uuid::new_v4();
        self.hysteresis.reset();
        self.score.reset(&self.config, now);
        self.frames_processed = 0;
        self.last_frame_at = None;

        info!(
            session_id = %self.id,
            "Monitoring {} in class {}",
            identity.student_name(),
            identity.class_code()
        );
        self.identity = Some(identity);
    }

    /// Stop monitoring; reporting ticks become no-ops
    pub fn stop(&mut self) -> Option<SessionIdentity> {
        let identity = self.identity.take();
        if let Some(identity) = &identity {
            info!(
                session_id = %self.id,
                final_score = self.score.value(),
                "Stopped monitoring {}",
                identity.student_name()
            );
        }
        identity
    }

    pub fn is_active(&self) -> bool {
        self.identity.is_some()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    pub fn score(&self) -> f64 {
        self.score.value()
    }

    pub fn flags(&self) -> FocusFlags {
        self.hysteresis.flags()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Process a frame now; `None` means no face was detected
    pub fn process_frame(&mut self, frame: Option<&LandmarkFrame>) -> FrameAnalysis {
        self.process_frame_at(frame, Instant::now())
    }

    /// Process a frame observed at `now`.
    ///
    /// Without an identity the session is frozen: the frame is measured but
    /// counters, flags, and score keep the values they had at stop.
    pub fn process_frame_at(&mut self, frame: Option<&LandmarkFrame>, now: Instant) -> FrameAnalysis {
        let openness = frame.map(|f| self.extractor.measure(f));
        if !self.is_active() {
            let flags = self.hysteresis.flags();
            return FrameAnalysis {
                face_detected: frame.is_some(),
                openness,
                flags,
                closed_eye_frames: self.hysteresis.closed_eye_frames,
                no_face_frames: self.hysteresis.no_face_frames,
                score: self.score.value(),
                score_change: ScoreChange::Unchanged,
                alerts: Vec::new(),
            };
        }

        let flags = self
            .hysteresis
            .observe(openness.map(|o| o.sample), &self.config);
        let score_change = self.score.update(flags, now, &self.config);

        self.frames_processed += 1;
        self.last_frame_at = Some(Utc::now());

        if score_change != ScoreChange::Unchanged {
            debug!(
                session_id = %self.id,
                sleepy = flags.is_sleepy,
                distracted = flags.is_distracted,
                "Engagement score now {:.1}",
                self.score.value()
            );
        }

        FrameAnalysis {
            face_detected: frame.is_some(),
            openness,
            flags,
            closed_eye_frames: self.hysteresis.closed_eye_frames,
            no_face_frames: self.hysteresis.no_face_frames,
            score: self.score.value(),
            score_change,
            alerts: alerts_for(flags),
        }
    }

    /// Report for the current state; `None` while no identity is set
    pub fn report_event(&self, timestamp: DateTime<Utc>) -> Option<ReportEvent> {
        let identity = self.identity.as_ref()?;
        let flags = self.hysteresis.flags();
        Some(ReportEvent {
            subject_id: identity.student_name.clone(),
            class_id: identity.class_code.clone(),
            score: self.score.value(),
            is_sleepy: flags.is_sleepy,
            is_distracted: flags.is_distracted,
            timestamp,
        })
    }

    pub fn snapshot(&self) -> EngagementSnapshot {
        let flags = self.hysteresis.flags();
        EngagementSnapshot {
            session_id: self.id,
            active: self.is_active(),
            student_name: self.identity.as_ref().map(|i| i.student_name.clone()),
            class_code: self.identity.as_ref().map(|i| i.class_code.clone()),
            score: self.score.value(),
            display_score: self.score.value().round() as u32,
            is_sleepy: flags.is_sleepy,
            is_distracted: flags.is_distracted,
            frames_processed: self.frames_processed,
            last_frame_at: self.last_frame_at,
        }
    }
}
