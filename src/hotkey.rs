//! Global emergency key detection
//!
//! Escape is watched system-wide, independent of window focus, so a
//! hand-tracking session can always be stopped from the keyboard.

use crate::state::SharedState;
use rdev::{listen, Event, EventType, Key};
use std::thread;

/// Start the global escape listener
///
/// The hook thread lives for the rest of the process; `rdev::listen` can
/// only be installed once.
pub fn start_escape_watcher(state: SharedState) -> Result<(), String> {
    thread::Builder::new()
        .name("escape-hook".to_string())
        .spawn(move || {
            let callback = move |event: Event| {
                if let Some(down) = escape_transition(&event.event_type) {
                    state.set_escape(down);
                }
            };

            // This blocks until an error occurs
            if let Err(e) = listen(callback) {
                log::error!("[HOTKEY] Global key listener error: {:?}", e);
            }
        })
        .map_err(|e| format!("Failed to spawn key listener: {}", e))?;

    Ok(())
}

/// Map a raw input event to an escape press (`true`) or release (`false`)
fn escape_transition(event: &EventType) -> Option<bool> {
    match event {
        EventType::KeyPress(Key::Escape) => Some(true),
        EventType::KeyRelease(Key::Escape) => Some(false),
        _ => None,
    }
}
