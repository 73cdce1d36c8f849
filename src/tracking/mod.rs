//! Hand-tracking cursor control
//!
//! Webcam frames go through a hand landmark model; the index fingertip drives
//! the system cursor and a thumb-index pinch clicks. A session ends on the
//! emergency key, the spoken stop phrase, or the preview window closing.

pub mod actuator;
pub mod cursor;
mod draw;
pub mod exit;
pub mod feedback;
pub mod frame;
pub mod gesture;
pub mod landmarks;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod session;

use crate::config::TrackingConfig;
use crate::speech::Recognition;
use crate::state::SharedState;
use crate::tts::Narrator;
use actuator::{ActuationError, ActuatorSink, EnigoActuator};
use exit::{EscapeKey, ExitArbiter, VoiceStop};
use feedback::{Feedback, WindowFeedback};
use flume::Receiver;
use frame::{CameraSource, CaptureError, FrameSource};
use landmarks::{DetectError, HandLandmarkDetector};
use session::{ControlLoop, SessionBackend, SessionError, SessionReport};
use std::sync::atomic::Ordering;

/// Real devices: webcam, ONNX landmark model, enigo and a minifb window
pub struct DesktopBackend {
    config: TrackingConfig,
}

impl DesktopBackend {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }
}

impl SessionBackend for DesktopBackend {
    fn open_source(&mut self) -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(CameraSource::open(self.config.camera_index, self.config.mirror)?))
    }

    #[cfg(feature = "onnx")]
    fn open_detector(&mut self) -> Result<Box<dyn HandLandmarkDetector>, DetectError> {
        Ok(Box::new(onnx::OnnxHandDetector::load(
            &self.config.model_path,
            self.config.min_confidence,
        )?))
    }

    #[cfg(not(feature = "onnx"))]
    fn open_detector(&mut self) -> Result<Box<dyn HandLandmarkDetector>, DetectError> {
        Err(DetectError::Unavailable("built without the onnx feature".into()))
    }

    fn open_actuator(&mut self) -> Result<Box<dyn ActuatorSink>, ActuationError> {
        Ok(Box::new(EnigoActuator::new()?))
    }

    fn open_feedback(&mut self) -> Box<dyn Feedback> {
        Box::new(WindowFeedback::new(&self.config.window_title, self.config.target_fps))
    }
}

/// Run one hand-tracking session on the calling thread and return when it ends
///
/// Blocks for the whole session; call from a thread that may block.
pub fn run_hand_tracking(
    config: &TrackingConfig,
    state: SharedState,
    narrator: &dyn Narrator,
    voice: Option<Receiver<Recognition>>,
) -> Result<SessionReport, SessionError> {
    run_with_backend(config, state, narrator, voice, &mut DesktopBackend::new(config.clone()))
}

fn run_with_backend(
    config: &TrackingConfig,
    state: SharedState,
    narrator: &dyn Narrator,
    voice: Option<Receiver<Recognition>>,
    backend: &mut dyn SessionBackend,
) -> Result<SessionReport, SessionError> {
    // A press from before the session must not end it
    state.clear_escape();
    let _active = TrackingActive::enter(state.clone());

    let arbiter = ExitArbiter::new(
        Box::new(EscapeKey::new(state.clone())),
        Box::new(VoiceStop::new(voice, &config.stop_phrase, config.voice_poll_timeout())),
    );
    let mut control = ControlLoop::new(config.clone(), arbiter, narrator);
    control.run(backend)
}

/// Holds `tracking_active` for its lifetime, unwinding included
struct TrackingActive {
    state: SharedState,
}

impl TrackingActive {
    fn enter(state: SharedState) -> Self {
        state.tracking_active.store(true, Ordering::SeqCst);
        Self { state }
    }
}

impl Drop for TrackingActive {
    fn drop(&mut self) {
        // Leaving with escape, held or tapped, must not also stop the assistant
        self.state.clear_escape();
        self.state.tracking_active.store(false, Ordering::SeqCst);
    }
}
