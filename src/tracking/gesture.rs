//! Pinch-to-click detection

use super::landmarks::{INDEX_FINGER_TIP, LandmarkSet, THUMB_TIP};
use std::time::{Duration, Instant};

/// Index-tip to thumb-tip distance in frame pixels
pub fn pinch_distance(hand: &LandmarkSet, frame_width: usize, frame_height: usize) -> f64 {
    let (ix, iy) = hand.pixel(INDEX_FINGER_TIP, frame_width, frame_height);
    let (tx, ty) = hand.pixel(THUMB_TIP, frame_width, frame_height);
    ((ix - tx).powi(2) + (iy - ty).powi(2)).sqrt()
}

pub struct GestureClassifier {
    threshold_px: f64,
    cooldown: Duration,
    last_click: Option<Instant>,
}

impl GestureClassifier {
    pub fn new(threshold_px: f64, cooldown: Duration) -> Self {
        Self {
            threshold_px,
            cooldown,
            last_click: None,
        }
    }

    /// True when this frame should produce a click
    pub fn evaluate(
        &mut self,
        hand: Option<&LandmarkSet>,
        frame_width: usize,
        frame_height: usize,
        now: Instant,
    ) -> bool {
        let Some(hand) = hand else {
            return false;
        };
        if pinch_distance(hand, frame_width, frame_height) >= self.threshold_px {
            return false;
        }

        let cooled = match self.last_click {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
        };
        if cooled {
            self.last_click = Some(now);
        }
        cooled
    }

    pub fn last_click(&self) -> Option<Instant> {
        self.last_click
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarks::tests::hand;

    const COOLDOWN: Duration = Duration::from_millis(200);

    fn pinched() -> LandmarkSet {
        hand((0.50, 0.50), (0.52, 0.50))
    }

    #[test]
    fn test_pinch_distance() {
        let set = hand((0.0, 0.0), (0.3, 0.4));
        assert!((pinch_distance(&set, 100, 100) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_within_cooldown_clicks_once() {
        let mut gesture = GestureClassifier::new(30.0, COOLDOWN);
        let t0 = Instant::now();
        assert!(gesture.evaluate(Some(&pinched()), 640, 480, t0));
        assert!(!gesture.evaluate(Some(&pinched()), 640, 480, t0 + Duration::from_millis(150)));
        assert_eq!(gesture.last_click(), Some(t0));
    }

    #[test]
    fn test_pinch_after_cooldown_clicks_twice() {
        let mut gesture = GestureClassifier::new(30.0, COOLDOWN);
        let t0 = Instant::now();
        assert!(gesture.evaluate(Some(&pinched()), 640, 480, t0));
        assert!(gesture.evaluate(Some(&pinched()), 640, 480, t0 + COOLDOWN));
    }

    #[test]
    fn test_open_hand_and_no_hand_never_click() {
        let mut gesture = GestureClassifier::new(30.0, COOLDOWN);
        let now = Instant::now();
        let open = hand((0.5, 0.2), (0.3, 0.6));
        assert!(!gesture.evaluate(Some(&open), 640, 480, now));
        assert!(!gesture.evaluate(None, 640, 480, now));
        assert_eq!(gesture.last_click(), None);
    }

    #[test]
    fn test_threshold_is_strict() {
        // exactly 30px apart
        let set = hand((0.0, 0.0), (0.3, 0.0));
        let mut gesture = GestureClassifier::new(30.0, COOLDOWN);
        assert!(!gesture.evaluate(Some(&set), 100, 100, Instant::now()));
    }
}
