//! Hand keypoints and the detector capability that produces them

use super::frame::Frame;
use thiserror::Error;

pub const LANDMARK_COUNT: usize = 21;

pub const THUMB_TIP: usize = 4;
pub const INDEX_FINGER_TIP: usize = 8;

/// Bone pairs of the 21-point hand model
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

/// Keypoint position normalized to the frame, nominally in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

/// The 21 keypoints of one detected hand
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from `(x, y)` pairs; `None` unless exactly 21 are given
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Option<Self> {
        if pairs.len() != LANDMARK_COUNT {
            return None;
        }
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (point, &(x, y)) in points.iter_mut().zip(pairs) {
            *point = Landmark { x, y };
        }
        Some(Self { points })
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Keypoint in frame pixels
    pub fn pixel(&self, index: usize, frame_width: usize, frame_height: usize) -> (f64, f64) {
        let p = self.point(index);
        (p.x * frame_width as f64, p.y * frame_height as f64)
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("landmark model unavailable: {0}")]
    Unavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Finds at most one hand in a frame
pub trait HandLandmarkDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, DetectError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// A hand with every keypoint at `rest`, except the thumb and index tips
    pub fn hand(index_tip: (f64, f64), thumb_tip: (f64, f64)) -> LandmarkSet {
        let mut pairs = vec![(0.5, 0.9); LANDMARK_COUNT];
        pairs[INDEX_FINGER_TIP] = index_tip;
        pairs[THUMB_TIP] = thumb_tip;
        LandmarkSet::from_pairs(&pairs).unwrap()
    }

    #[test]
    fn test_from_pairs_requires_full_hand() {
        assert!(LandmarkSet::from_pairs(&[(0.0, 0.0); 20]).is_none());
        assert!(LandmarkSet::from_pairs(&[(0.0, 0.0); 21]).is_some());
    }

    #[test]
    fn test_pixel() {
        let set = hand((0.25, 0.5), (0.0, 0.0));
        assert_eq!(set.pixel(INDEX_FINGER_TIP, 640, 480), (160.0, 240.0));
        // wrist
        assert_eq!(set.pixel(0, 100, 100), (50.0, 90.0));
    }

    #[test]
    fn test_connections_reach_every_point() {
        let mut seen = [false; LANDMARK_COUNT];
        for (a, b) in HAND_CONNECTIONS {
            seen[a] = true;
            seen[b] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
