//! The hand-tracking control loop
//!
//! One session owns the camera, the preview window and the cursor state from
//! `Starting` until `Stopped`. Each tick runs, in order: exit check, frame
//! read, landmark detection, cursor mapping, pinch classification, actuation
//! and preview. All devices are released on every way out, including unwinding,
//! because the loop holds them by value.

use super::actuator::{ActuationError, ActuatorSink};
use super::cursor::{CursorMapper, ScreenBounds};
use super::exit::{ExitArbiter, ExitSignal};
use super::feedback::Feedback;
use super::frame::{CaptureError, FrameSource};
use super::gesture::GestureClassifier;
use super::landmarks::{DetectError, HandLandmarkDetector};
use crate::config::TrackingConfig;
use crate::stats::{StatKind, TickStats, Timer};
use crate::tts::Narrator;
use crate::ui;
use std::time::Instant;
use thiserror::Error;

pub const STARTED_MESSAGE: &str = "Hand tracking mode started. Use index finger to move cursor, pinch thumb and index for click. Say 'stop hand tracking' or press Esc to exit.";
pub const STOPPED_MESSAGE: &str = "Hand tracking stopped";
pub const READ_FAILED_MESSAGE: &str = "Failed to read from webcam";
pub const OPEN_FAILED_MESSAGE: &str = "Failed to access webcam";
pub const START_FAILED_MESSAGE: &str = "Failed to start hand tracking";

const STATUS_EVERY_TICKS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    Exit(ExitSignal),
    ReadFailure(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    DeviceUnavailable(#[from] CaptureError),
    #[error("screen unavailable: {0}")]
    ScreenUnavailable(#[from] ActuationError),
    #[error(transparent)]
    DetectorUnavailable(#[from] DetectError),
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub reason: StopReason,
    /// Frames read and processed
    pub ticks: u64,
    pub clicks: u32,
    pub final_cursor: (f64, f64),
    pub timing: String,
}

/// Opens the devices a session needs
pub trait SessionBackend {
    fn open_source(&mut self) -> Result<Box<dyn FrameSource>, CaptureError>;
    fn open_detector(&mut self) -> Result<Box<dyn HandLandmarkDetector>, DetectError>;
    fn open_actuator(&mut self) -> Result<Box<dyn ActuatorSink>, ActuationError>;
    fn open_feedback(&mut self) -> Box<dyn Feedback>;
}

struct Devices {
    source: Box<dyn FrameSource>,
    detector: Box<dyn HandLandmarkDetector>,
    actuator: Box<dyn ActuatorSink>,
    feedback: Box<dyn Feedback>,
}

pub struct ControlLoop<'a> {
    state: LoopState,
    config: TrackingConfig,
    arbiter: ExitArbiter,
    narrator: &'a dyn Narrator,
    stats: TickStats,
    ticks: u64,
    clicks: u32,
}

impl<'a> ControlLoop<'a> {
    pub fn new(config: TrackingConfig, arbiter: ExitArbiter, narrator: &'a dyn Narrator) -> Self {
        Self {
            state: LoopState::Starting,
            config,
            arbiter,
            narrator,
            stats: TickStats::default(),
            ticks: 0,
            clicks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run one session to completion
    pub fn run(&mut self, backend: &mut dyn SessionBackend) -> Result<SessionReport, SessionError> {
        let (mut devices, screen) = match self.start(backend) {
            Ok(started) => started,
            Err(e) => {
                log::error!("[TRACKING] {}", e);
                self.state = LoopState::Stopped;
                return Err(e);
            }
        };

        self.state = LoopState::Running;
        self.narrator.say(STARTED_MESSAGE);
        log::info!(
            "[TRACKING] Running on {}x{} screen (alpha {}, pinch < {}px)",
            screen.width,
            screen.height,
            self.config.smoothing,
            self.config.click_threshold_px
        );

        let mut mapper = CursorMapper::new(screen, self.config.smoothing);
        let mut gesture = GestureClassifier::new(self.config.click_threshold_px, self.config.click_cooldown());

        let reason = loop {
            if let Some(reason) = self.tick(&mut devices, &mut mapper, &mut gesture) {
                break reason;
            }
        };

        self.state = LoopState::Stopping;
        ui::clear_line();
        devices.source.close();
        devices.feedback.close();
        drop(devices);

        match &reason {
            StopReason::Exit(signal) => {
                log::info!("[TRACKING] Stopped by {:?}", signal);
                self.narrator.say(STOPPED_MESSAGE);
            }
            StopReason::ReadFailure(e) => {
                log::error!("[TRACKING] {}", e);
                self.narrator.say(READ_FAILED_MESSAGE);
            }
        }

        let report = SessionReport {
            reason,
            ticks: self.ticks,
            clicks: self.clicks,
            final_cursor: mapper.position(),
            timing: self.stats.summary(),
        };
        log::info!("[TRACKING] {} frames, {} clicks\n{}", report.ticks, report.clicks, report.timing);

        self.state = LoopState::Stopped;
        Ok(report)
    }

    fn start(&mut self, backend: &mut dyn SessionBackend) -> Result<(Devices, ScreenBounds), SessionError> {
        let source = match backend.open_source() {
            Ok(source) => source,
            Err(e) => {
                self.narrator.say(OPEN_FAILED_MESSAGE);
                return Err(e.into());
            }
        };

        let rest = backend
            .open_actuator()
            .map_err(SessionError::from)
            .and_then(|actuator| {
                let (w, h) = actuator.screen_size()?;
                let detector = backend.open_detector()?;
                Ok((actuator, detector, w, h))
            });
        let (actuator, detector, width, height) = match rest {
            Ok(rest) => rest,
            Err(e) => {
                // source drops here and releases the camera
                self.narrator.say(START_FAILED_MESSAGE);
                return Err(e);
            }
        };

        let devices = Devices {
            source,
            detector,
            actuator,
            feedback: backend.open_feedback(),
        };
        let screen = ScreenBounds {
            width: width as f64,
            height: height as f64,
        };
        Ok((devices, screen))
    }

    #[hotpath::measure]
    fn tick(
        &mut self,
        devices: &mut Devices,
        mapper: &mut CursorMapper,
        gesture: &mut GestureClassifier,
    ) -> Option<StopReason> {
        let tick_timer = Timer::new(StatKind::Tick);

        let voice_timer = Timer::new(StatKind::VoicePoll);
        let feedback = &devices.feedback;
        let signal = self.arbiter.poll(|| feedback.exit_requested());
        voice_timer.finish(&mut self.stats);
        if signal.is_exit() {
            return Some(StopReason::Exit(signal));
        }

        let capture_timer = Timer::new(StatKind::Capture);
        let frame = match devices.source.read() {
            Ok(frame) => frame,
            Err(e) => return Some(StopReason::ReadFailure(e.to_string())),
        };
        capture_timer.finish(&mut self.stats);

        let detect_timer = Timer::new(StatKind::Detection);
        let hand = match devices.detector.detect(&frame) {
            Ok(hand) => hand,
            Err(e) => {
                log::debug!("[TRACKING] Detection skipped: {}", e);
                None
            }
        };
        detect_timer.finish(&mut self.stats);

        let (w, h) = (frame.width, frame.height);
        if let Some(pos) = mapper.update(hand.as_ref(), w, h) {
            if let Err(e) = devices.actuator.move_to(pos.0, pos.1) {
                log::warn!("[TRACKING] {}", e);
            }
        }

        let clicking = gesture.evaluate(hand.as_ref(), w, h, Instant::now());
        if clicking {
            self.clicks += 1;
            if let Err(e) = devices.actuator.click() {
                log::warn!("[TRACKING] {}", e);
            }
        }

        devices.feedback.present(frame, hand.as_ref(), clicking);

        self.ticks += 1;
        if self.ticks % STATUS_EVERY_TICKS == 0 {
            ui::tracking_status(self.ticks, self.clicks, mapper.position());
        }
        tick_timer.finish(&mut self.stats);
        None
    }
}
