//! Facial landmark types

use serde::{Deserialize, Serialize};

/// 2-D landmark point, in whatever units the detector emits
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Landmarks of one detected face in one frame, indexed by landmark id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    points: Vec<Point>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Get landmark by id
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl FromIterator<Point> for LandmarkFrame {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Six landmark ids describing one eye.
///
/// Order: outer corner, upper lid 1, upper lid 2, inner corner,
/// lower lid 1, lower lid 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EyeLandmarkSet(pub [usize; 6]);

impl EyeLandmarkSet {
    /// MediaPipe face mesh, subject's left eye
    pub const LEFT: Self = Self([33, 160, 158, 133, 153, 144]);

    /// MediaPipe face mesh, subject's right eye
    pub const RIGHT: Self = Self([362, 385, 387, 263, 373, 380]);

    pub fn indices(&self) -> [usize; 6] {
        self.0
    }

    /// Look up the six points in a frame; `None` if any id is missing
    pub fn resolve(&self, frame: &LandmarkFrame) -> Option<[Point; 6]> {
        let mut points = [Point::default(); 6];
        for (slot, &index) in points.iter_mut().zip(self.0.iter()) {
            *slot = frame.get(index)?;
        }
        Some(points)
    }
}
