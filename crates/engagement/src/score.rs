//! Time-gated engagement score

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::RecoveryAnchor;
use crate::state::FocusFlags;
use crate::EngagementConfig;

/// What a score update did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreChange {
    Penalty,
    Recovery,
    Unchanged,
}

/// Engagement score with independent penalty and recovery timers.
///
/// At most one penalty per penalty interval and one recovery per recovery
/// interval; the value is always within `[min_score, max_score]`.
#[derive(Debug, Clone)]
pub struct EngagementScore {
    value: f64,
    last_penalty: Instant,
    last_recovery: Instant,
    /// Previous frame was sleepy or distracted
    penalized: bool,
}

impl EngagementScore {
    /// Full score, both timers at `now`
    pub fn new(config: &EngagementConfig, now: Instant) -> Self {
        Self {
            value: config.max_score,
            last_penalty: now,
            last_recovery: now,
            penalized: false,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn last_penalty(&self) -> Instant {
        self.last_penalty
    }

    pub fn last_recovery(&self) -> Instant {
        self.last_recovery
    }

    /// Apply one frame's flags at time `now`
    pub fn update(&mut self, flags: FocusFlags, now: Instant, config: &EngagementConfig) -> ScoreChange {
        let mut change = ScoreChange::Unchanged;

        if flags.is_penalized() {
            self.penalized = true;
            if now.saturating_duration_since(self.last_penalty) >= config.penalty_interval() {
                self.value -= config.penalty_points;
                self.last_penalty = now;
                change = ScoreChange::Penalty;
            }
        } else {
            if self.penalized {
                self.penalized = false;
                if config.recovery_anchor == RecoveryAnchor::FocusStart {
                    self.last_recovery = now;
                }
            }
            if self.value < config.max_score
                && now.saturating_duration_since(self.last_recovery) >= config.recovery_interval()
            {
                self.value += config.recovery_points;
                self.last_recovery = now;
                change = ScoreChange::Recovery;
            }
        }

        // f64::clamp panics on an inverted range
        self.value = self.value.max(config.min_score).min(config.max_score);

        if change != ScoreChange::Unchanged {
            debug!("Score {:?} -> {:.1}", change, self.value);
        }
        change
    }

    /// Restart at full score with both timers at `now`
    pub fn reset(&mut self, config: &EngagementConfig, now: Instant) {
        *self = Self::new(config, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SLEEPY: FocusFlags = FocusFlags {
        is_sleepy: true,
        is_distracted: false,
    };
    const DISTRACTED: FocusFlags = FocusFlags {
        is_sleepy: false,
        is_distracted: true,
    };
    const FOCUSED: FocusFlags = FocusFlags {
        is_sleepy: false,
        is_distracted: false,
    };

    fn ms(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    #[test]
    fn test_focus_keeps_full_score() {
        let config = EngagementConfig::default();
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);

        for step in 0..500 {
            let change = score.update(FOCUSED, ms(t0, step * 100), &config);
            assert_eq!(change, ScoreChange::Unchanged);
            assert_eq!(score.value(), 100.0);
        }
    }

    #[test]
    fn test_continuous_penalty() {
        let config = EngagementConfig::default();
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);

        score.update(SLEEPY, t0, &config);
        assert_eq!(score.value(), 100.0);
        score.update(SLEEPY, ms(t0, 1999), &config);
        assert_eq!(score.value(), 100.0);
        assert_eq!(score.update(SLEEPY, ms(t0, 2000), &config), ScoreChange::Penalty);
        assert_eq!(score.value(), 99.0);
        score.update(SLEEPY, ms(t0, 3000), &config);
        assert_eq!(score.value(), 99.0);
        score.update(SLEEPY, ms(t0, 4000), &config);
        assert_eq!(score.value(), 98.0);
    }

    #[test]
    fn test_distracted_penalizes_too() {
        let config = EngagementConfig::default();
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);
        assert_eq!(score.update(DISTRACTED, ms(t0, 2500), &config), ScoreChange::Penalty);
        assert_eq!(score.value(), 99.0);
    }

    #[test]
    fn test_one_penalty_per_window_despite_gap() {
        let config = EngagementConfig::default();
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);

        // A long stall still yields a single point
        score.update(SLEEPY, ms(t0, 60_000), &config);
        assert_eq!(score.value(), 99.0);
    }

    #[test]
    fn test_score_floor() {
        let config = EngagementConfig::default();
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);

        for step in 1..=300 {
            score.update(SLEEPY, ms(t0, step * 2000), &config);
            assert!(score.value() >= 0.0);
        }
        assert_eq!(score.value(), 0.0);
    }

    #[test]
    fn test_recovery_waits_full_interval_after_penalty() {
        let config = EngagementConfig::default();
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);

        score.update(SLEEPY, ms(t0, 2000), &config);
        score.update(SLEEPY, ms(t0, 4000), &config);
        assert_eq!(score.value(), 98.0);

        // Focus begins at 4100
        assert_eq!(score.update(FOCUSED, ms(t0, 4100), &config), ScoreChange::Unchanged);
        score.update(FOCUSED, ms(t0, 6000), &config);
        assert_eq!(score.value(), 98.0);
        assert_eq!(score.update(FOCUSED, ms(t0, 6100), &config), ScoreChange::Recovery);
        assert_eq!(score.value(), 99.0);
        score.update(FOCUSED, ms(t0, 8100), &config);
        assert_eq!(score.value(), 100.0);
        score.update(FOCUSED, ms(t0, 10_100), &config);
        assert_eq!(score.value(), 100.0);
    }

    #[test]
    fn test_last_recovery_anchor_allows_immediate_recovery() {
        let config = EngagementConfig {
            recovery_anchor: RecoveryAnchor::LastRecovery,
            ..Default::default()
        };
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);

        score.update(SLEEPY, ms(t0, 2000), &config);
        score.update(SLEEPY, ms(t0, 4000), &config);
        assert_eq!(score.update(FOCUSED, ms(t0, 4100), &config), ScoreChange::Recovery);
        assert_eq!(score.value(), 99.0);
    }

    #[test]
    fn test_penalty_does_not_touch_recovery_timer() {
        let config = EngagementConfig::default();
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);
        score.update(SLEEPY, ms(t0, 2000), &config);
        assert_eq!(score.last_recovery(), t0);
        assert_eq!(score.last_penalty(), ms(t0, 2000));
    }

    #[test]
    fn test_custom_magnitudes_stay_in_bounds() {
        let config = EngagementConfig {
            penalty_points: 30.0,
            recovery_points: 25.0,
            ..Default::default()
        };
        let t0 = Instant::now();
        let mut score = EngagementScore::new(&config, t0);
        for step in 1..=4 {
            score.update(SLEEPY, ms(t0, step * 2000), &config);
        }
        assert_eq!(score.value(), 0.0);

        score.update(FOCUSED, ms(t0, 9000), &config);
        for step in 1..=5 {
            score.update(FOCUSED, ms(t0, 9000 + step * 2000), &config);
        }
        assert_eq!(score.value(), 100.0);
    }
}
