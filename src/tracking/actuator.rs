//! System cursor control

use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
    #[error("{action} failed: {reason}")]
    Failed { action: &'static str, reason: String },
}

pub trait ActuatorSink {
    fn move_to(&mut self, x: f64, y: f64) -> Result<(), ActuationError>;
    fn click(&mut self) -> Result<(), ActuationError>;
    /// Main display size in pixels
    fn screen_size(&self) -> Result<(u32, u32), ActuationError>;
}

pub struct EnigoActuator {
    enigo: Enigo,
}

impl EnigoActuator {
    pub fn new() -> Result<Self, ActuationError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| ActuationError::Unavailable(e.to_string()))?;
        Ok(Self { enigo })
    }
}

impl ActuatorSink for EnigoActuator {
    fn move_to(&mut self, x: f64, y: f64) -> Result<(), ActuationError> {
        self.enigo
            .move_mouse(x.round() as i32, y.round() as i32, Coordinate::Abs)
            .map_err(|e| ActuationError::Failed {
                action: "move",
                reason: e.to_string(),
            })
    }

    fn click(&mut self) -> Result<(), ActuationError> {
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| ActuationError::Failed {
                action: "click",
                reason: e.to_string(),
            })
    }

    fn screen_size(&self) -> Result<(u32, u32), ActuationError> {
        let (w, h) = self.enigo.main_display().map_err(|e| ActuationError::Failed {
            action: "display query",
            reason: e.to_string(),
        })?;
        if w <= 0 || h <= 0 {
            return Err(ActuationError::Failed {
                action: "display query",
                reason: format!("invalid display size {}x{}", w, h),
            });
        }
        Ok((w as u32, h as u32))
    }
}
