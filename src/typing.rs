//! Keyboard text entry for the "type ..." command
//!
//! Two ways of getting text into the focused application:
//! - **Direct**: enigo's native text input
//! - **Clipboard**: put the text on the clipboard and send Cmd/Ctrl+V

use arboard::Clipboard;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InputMethod {
    #[default]
    Direct,
    Clipboard,
}

impl InputMethod {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "clipboard" => InputMethod::Clipboard,
            _ => InputMethod::Direct,
        }
    }
}

#[derive(Debug, Error)]
pub enum TypingError {
    #[error("keyboard unavailable: {0}")]
    Keyboard(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

pub struct TypingInput {
    enigo: Enigo,
    method: InputMethod,
}

impl TypingInput {
    pub fn new(method: InputMethod) -> Result<Self, TypingError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| TypingError::Keyboard(e.to_string()))?;
        Ok(Self { enigo, method })
    }

    /// Type text with the configured method; clipboard falls back to direct
    pub fn type_text(&mut self, text: &str) -> Result<(), TypingError> {
        if text.is_empty() {
            return Ok(());
        }

        match self.method {
            InputMethod::Direct => self.type_direct(text),
            InputMethod::Clipboard => match self.type_via_clipboard(text) {
                Ok(()) => Ok(()),
                Err(e) => {
                    log::warn!("[TYPING] Clipboard method failed: {}, trying direct", e);
                    self.type_direct(text)
                }
            },
        }
    }

    fn type_direct(&mut self, text: &str) -> Result<(), TypingError> {
        self.enigo
            .text(text)
            .map_err(|e| TypingError::Keyboard(e.to_string()))
    }

    fn type_via_clipboard(&mut self, text: &str) -> Result<(), TypingError> {
        let mut clipboard = Clipboard::new().map_err(|e| TypingError::Clipboard(e.to_string()))?;
        let previous = clipboard.get_text().ok();

        clipboard
            .set_text(text)
            .map_err(|e| TypingError::Clipboard(e.to_string()))?;
        thread::sleep(Duration::from_millis(50));

        let pasted = self.paste();
        thread::sleep(Duration::from_millis(100));

        // Best effort restore, even when the paste failed
        if let Some(old) = previous {
            let _ = clipboard.set_text(old);
        }
        pasted
    }

    fn paste(&mut self) -> Result<(), TypingError> {
        let modifier = modifier_key();
        let press = |enigo: &mut Enigo, key, dir| {
            enigo
                .key(key, dir)
                .map_err(|e| TypingError::Keyboard(e.to_string()))
        };

        press(&mut self.enigo, modifier, Direction::Press)?;
        thread::sleep(Duration::from_millis(10));
        let clicked = press(&mut self.enigo, Key::Unicode('v'), Direction::Click);
        thread::sleep(Duration::from_millis(50));
        press(&mut self.enigo, modifier, Direction::Release)?;
        clicked
    }
}

/// Cmd on macOS, Ctrl elsewhere
fn modifier_key() -> Key {
    #[cfg(target_os = "macos")]
    {
        Key::Meta
    }
    #[cfg(not(target_os = "macos"))]
    {
        Key::Control
    }
}
