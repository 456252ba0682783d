//! Eye openness from landmark geometry

use serde::{Deserialize, Serialize};

use crate::landmarks::{EyeLandmarkSet, LandmarkFrame, Point};
use crate::EngagementConfig;

/// Corner-to-corner distances below this are treated as a collapsed eye
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Eye aspect ratio of one eye.
///
/// `(|p2-p6| + |p3-p5|) / (2 |p1-p4|)`. Returns `None` when the points
/// are non-finite or the corners coincide.
pub fn eye_aspect_ratio(points: &[Point; 6]) -> Option<f64> {
    if points.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let horizontal = points[0].distance(&points[3]);
    if horizontal < DEGENERATE_EPSILON {
        return None;
    }

    let v1 = points[1].distance(&points[5]);
    let v2 = points[2].distance(&points[4]);
    let ear = (v1 + v2) / (2.0 * horizontal);

    ear.is_finite().then_some(ear)
}

/// Per-frame openness signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OpennessSample {
    /// Mean EAR of both eyes
    Measured(f64),
    /// Landmarks could not produce a ratio; counts as open
    Degenerate,
}

impl OpennessSample {
    /// Closed only for a measured ratio under the threshold
    pub fn is_closed(&self, threshold: f64) -> bool {
        matches!(self, Self::Measured(ratio) if *ratio < threshold)
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Measured(ratio) => Some(*ratio),
            Self::Degenerate => None,
        }
    }
}

/// Openness of both eyes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeOpenness {
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub sample: OpennessSample,
}

/// Computes openness samples from landmark frames
#[derive(Debug, Clone)]
pub struct OpennessExtractor {
    left: EyeLandmarkSet,
    right: EyeLandmarkSet,
}

impl OpennessExtractor {
    pub fn new(config: &EngagementConfig) -> Self {
        Self {
            left: config.left_eye,
            right: config.right_eye,
        }
    }

    /// Measure both eyes and average them
    pub fn measure(&self, frame: &LandmarkFrame) -> EyeOpenness {
        let left = self.left.resolve(frame).and_then(|p| eye_aspect_ratio(&p));
        let right = self.right.resolve(frame).and_then(|p| eye_aspect_ratio(&p));

        let sample = match (left, right) {
            (Some(l), Some(r)) => OpennessSample::Measured((l + r) / 2.0),
            _ => OpennessSample::Degenerate,
        };

        EyeOpenness { left, right, sample }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Eye 10 units wide with lids `gap` apart
    fn eye(origin_x: f64, gap: f64) -> [Point; 6] {
        let half = gap / 2.0;
        [
            Point::new(origin_x, 0.0),
            Point::new(origin_x + 3.0, -half),
            Point::new(origin_x + 7.0, -half),
            Point::new(origin_x + 10.0, 0.0),
            Point::new(origin_x + 7.0, half),
            Point::new(origin_x + 3.0, half),
        ]
    }

    fn frame_with_eyes(left: [Point; 6], right: [Point; 6]) -> LandmarkFrame {
        let mut points = vec![Point::default(); 12];
        points[..6].copy_from_slice(&left);
        points[6..].copy_from_slice(&right);
        LandmarkFrame::new(points)
    }

    fn test_extractor() -> OpennessExtractor {
        OpennessExtractor::new(&EngagementConfig {
            left_eye: EyeLandmarkSet([0, 1, 2, 3, 4, 5]),
            right_eye: EyeLandmarkSet([6, 7, 8, 9, 10, 11]),
            ..Default::default()
        })
    }

    #[test]
    fn test_ear_open_and_closed() {
        // 3 + 3 over 2 * 10
        let ear = eye_aspect_ratio(&eye(0.0, 3.0)).unwrap();
        assert!((ear - 0.3).abs() < 1e-12);

        let closed = eye_aspect_ratio(&eye(0.0, 1.0)).unwrap();
        assert!(closed < 0.21);
    }

    #[test]
    fn test_ear_scale_invariant() {
        let small = eye(0.0, 3.0);
        let large = small.map(|p| Point::new(p.x * 40.0, p.y * 40.0));
        let a = eye_aspect_ratio(&small).unwrap();
        let b = eye_aspect_ratio(&large).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_corners() {
        let collapsed = [Point::new(1.0, 1.0); 6];
        assert_eq!(eye_aspect_ratio(&collapsed), None);

        let mut nan = eye(0.0, 3.0);
        nan[2] = Point::new(f64::NAN, 0.0);
        assert_eq!(eye_aspect_ratio(&nan), None);
    }

    #[test]
    fn test_measure_averages_both_eyes() {
        let openness = test_extractor().measure(&frame_with_eyes(eye(0.0, 2.0), eye(20.0, 4.0)));
        assert!((openness.left.unwrap() - 0.2).abs() < 1e-12);
        assert!((openness.right.unwrap() - 0.4).abs() < 1e-12);
        match openness.sample {
            OpennessSample::Measured(r) => assert!((r - 0.3).abs() < 1e-12),
            OpennessSample::Degenerate => panic!("expected a measured sample"),
        }
    }

    #[test]
    fn test_degenerate_sample_counts_as_open() {
        let collapsed = [Point::new(5.0, 5.0); 6];
        let openness = test_extractor().measure(&frame_with_eyes(eye(0.0, 0.5), collapsed));
        assert_eq!(openness.sample, OpennessSample::Degenerate);
        assert!(!openness.sample.is_closed(0.21));
    }

    #[test]
    fn test_short_frame_is_degenerate() {
        let frame = LandmarkFrame::new(vec![Point::new(0.0, 0.0); 10]);
        let openness = OpennessExtractor::new(&EngagementConfig::default()).measure(&frame);
        assert_eq!(openness.sample, OpennessSample::Degenerate);
        assert_eq!(openness.left, None);
    }

    proptest! {
        #[test]
        fn prop_ear_non_negative_and_finite(
            coords in proptest::array::uniform12(-1000.0f64..1000.0),
        ) {
            let points: [Point; 6] = std::array::from_fn(|i| Point::new(coords[2 * i], coords[2 * i + 1]));
            prop_assume!(points[0].distance(&points[3]) >= DEGENERATE_EPSILON);
            let ear = eye_aspect_ratio(&points);
            prop_assert!(ear.is_some());
            let ear = ear.unwrap();
            prop_assert!(ear >= 0.0);
            prop_assert!(ear.is_finite());
        }
    }
}
