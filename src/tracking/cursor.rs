//! Fingertip to screen mapping with exponential smoothing

use super::landmarks::{INDEX_FINGER_TIP, LandmarkSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBounds {
    pub width: f64,
    pub height: f64,
}

/// Linear map of `value` from `[0, in_max]` onto `[0, out_max]`, clamped to the input range
pub fn interp(value: f64, in_max: f64, out_max: f64) -> f64 {
    if in_max <= 0.0 {
        return 0.0;
    }
    value.clamp(0.0, in_max) / in_max * out_max
}

pub struct CursorMapper {
    screen: ScreenBounds,
    alpha: f64,
    previous: (f64, f64),
}

impl CursorMapper {
    /// `alpha` must be in (0, 1); the cursor starts at the origin
    pub fn new(screen: ScreenBounds, alpha: f64) -> Self {
        debug_assert!(alpha > 0.0 && alpha < 1.0);
        Self {
            screen,
            alpha,
            previous: (0.0, 0.0),
        }
    }

    /// Unsmoothed screen position of the index fingertip
    pub fn target(&self, hand: &LandmarkSet, frame_width: usize, frame_height: usize) -> (f64, f64) {
        let (px, py) = hand.pixel(INDEX_FINGER_TIP, frame_width, frame_height);
        (
            interp(px, frame_width as f64, self.screen.width),
            interp(py, frame_height as f64, self.screen.height),
        )
    }

    /// Advance the smoothed cursor toward the fingertip
    ///
    /// Returns the new position, or `None` (state untouched) without a hand.
    pub fn update(
        &mut self,
        hand: Option<&LandmarkSet>,
        frame_width: usize,
        frame_height: usize,
    ) -> Option<(f64, f64)> {
        let hand = hand?;
        let target = self.target(hand, frame_width, frame_height);
        Some(self.step_toward(target))
    }

    pub fn step_toward(&mut self, target: (f64, f64)) -> (f64, f64) {
        let (px, py) = self.previous;
        let smoothed = (
            px + (target.0 - px) * self.alpha,
            py + (target.1 - py) * self.alpha,
        );
        self.previous = smoothed;
        smoothed
    }

    pub fn position(&self) -> (f64, f64) {
        self.previous
    }
}
