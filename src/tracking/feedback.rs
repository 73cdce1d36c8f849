//! Preview window showing the camera feed with the detected hand

use super::draw;
use super::frame::Frame;
use super::landmarks::LandmarkSet;
use minifb::{Key, Window, WindowOptions};

pub trait Feedback {
    /// Show the annotated frame
    fn present(&mut self, frame: Frame, hand: Option<&LandmarkSet>, clicking: bool);
    /// Escape was pressed in the window, or the window was closed
    fn exit_requested(&self) -> bool;
    fn close(&mut self);
}

/// minifb window, created on the first frame so it matches the camera size
pub struct WindowFeedback {
    title: String,
    target_fps: usize,
    window: Option<Window>,
    buffer: Vec<u32>,
    disabled: bool,
}

impl WindowFeedback {
    pub fn new(title: &str, target_fps: usize) -> Self {
        Self {
            title: title.to_string(),
            target_fps,
            window: None,
            buffer: Vec::new(),
            disabled: false,
        }
    }

    fn window_for(&mut self, width: usize, height: usize) -> Option<&mut Window> {
        if self.disabled {
            return None;
        }
        if self.window.is_none() {
            match Window::new(&self.title, width, height, WindowOptions::default()) {
                Ok(mut window) => {
                    window.set_target_fps(self.target_fps);
                    self.window = Some(window);
                }
                Err(e) => {
                    log::warn!("[TRACKING] No preview window ({}), continuing without it", e);
                    self.disabled = true;
                    return None;
                }
            }
        }
        self.window.as_mut()
    }
}

impl Feedback for WindowFeedback {
    fn present(&mut self, mut frame: Frame, hand: Option<&LandmarkSet>, clicking: bool) {
        if let Some(hand) = hand {
            draw::draw_hand(&mut frame, hand, clicking);
        }
        let mut buffer = std::mem::take(&mut self.buffer);
        draw::to_argb(&frame, &mut buffer);

        if let Some(window) = self.window_for(frame.width, frame.height) {
            if let Err(e) = window.update_with_buffer(&buffer, frame.width, frame.height) {
                log::debug!("[TRACKING] Preview update failed: {}", e);
            }
        }
        self.buffer = buffer;
    }

    fn exit_requested(&self) -> bool {
        match &self.window {
            Some(window) => !window.is_open() || window.is_key_down(Key::Escape),
            None => false,
        }
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            log::debug!("[TRACKING] Preview window closed");
        }
    }
}
