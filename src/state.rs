//! Shared runtime state - thread-safe flags read by the assistant loop, the
//! voice listener and the hand-tracking session

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared runtime state - accessible from all components
///
/// All fields use atomic operations for thread-safe access without locks.
/// Pass `Arc<RuntimeState>` to components that need to read or modify state.
pub struct RuntimeState {
    // ========================================================================
    // Keyboard state
    // ========================================================================
    /// Escape is currently held down (global hook)
    pub escape_down: AtomicBool,
    /// Escape was pressed since the last time a consumer took the press
    escape_pressed: AtomicBool,
    /// The current hold was already consumed; ignored until the key is released
    escape_swallowed: AtomicBool,

    // ========================================================================
    // Audio state
    // ========================================================================
    /// Narration is playing; the listener drops microphone audio meanwhile
    pub narrating: AtomicBool,

    // ========================================================================
    // Mode state
    // ========================================================================
    /// A hand-tracking session owns the camera and cursor
    pub tracking_active: AtomicBool,
}

impl RuntimeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            escape_down: AtomicBool::new(false),
            escape_pressed: AtomicBool::new(false),
            escape_swallowed: AtomicBool::new(false),
            narrating: AtomicBool::new(false),
            tracking_active: AtomicBool::new(false),
        })
    }

    // ========================================================================
    // Escape helpers
    // ========================================================================

    /// Record an escape key press or release from the global hook
    pub fn set_escape(&self, down: bool) {
        let was_down = self.escape_down.swap(down, Ordering::SeqCst);
        if !down || !was_down {
            // release, or a fresh press rather than key repeat
            self.escape_swallowed.store(false, Ordering::SeqCst);
        }
        if down {
            self.escape_pressed.store(true, Ordering::SeqCst);
        }
    }

    /// True if escape is held or was tapped since the last call; clears the tap
    pub fn take_escape(&self) -> bool {
        let tapped = self.escape_pressed.swap(false, Ordering::SeqCst);
        if self.escape_swallowed.load(Ordering::SeqCst) {
            return false;
        }
        tapped || self.escape_down.load(Ordering::SeqCst)
    }

    /// Forget a pending tap and ignore the key until it is next released
    pub fn clear_escape(&self) {
        self.escape_pressed.store(false, Ordering::SeqCst);
        self.escape_swallowed
            .store(self.escape_down.load(Ordering::SeqCst), Ordering::SeqCst);
    }

    // ========================================================================
    // Audio helpers
    // ========================================================================

    /// Check if microphone audio should be segmented and transcribed
    pub fn should_listen(&self) -> bool {
        !self.narrating.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeState")
            .field("escape_down", &self.escape_down.load(Ordering::SeqCst))
            .field("escape_pressed", &self.escape_pressed.load(Ordering::SeqCst))
            .field("escape_swallowed", &self.escape_swallowed.load(Ordering::SeqCst))
            .field("narrating", &self.narrating.load(Ordering::SeqCst))
            .field("tracking_active", &self.tracking_active.load(Ordering::SeqCst))
            .finish()
    }
}

/// Type alias for shared state
pub type SharedState = Arc<RuntimeState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_tap_is_taken_once() {
        let state = RuntimeState::new();
        state.set_escape(true);
        state.set_escape(false);
        assert!(state.take_escape());
        assert!(!state.take_escape());
    }

    #[test]
    fn test_escape_held() {
        let state = RuntimeState::new();
        state.set_escape(true);
        assert!(state.take_escape());
        assert!(state.take_escape());
        state.set_escape(false);
        assert!(!state.take_escape());
    }

    #[test]
    fn test_cleared_hold_is_ignored_until_released() {
        let state = RuntimeState::new();
        state.set_escape(true);
        state.clear_escape();
        assert!(!state.take_escape());

        // key repeat while still held
        state.set_escape(true);
        assert!(!state.take_escape());

        state.set_escape(false);
        assert!(!state.take_escape());
        state.set_escape(true);
        assert!(state.take_escape());
    }

    #[test]
    fn test_clear_without_hold_keeps_next_press() {
        let state = RuntimeState::new();
        state.set_escape(true);
        state.set_escape(false);
        state.clear_escape();
        assert!(!state.take_escape());
        state.set_escape(true);
        state.set_escape(false);
        assert!(state.take_escape());
    }

    #[test]
    fn test_listen_gate() {
        let state = RuntimeState::new();
        assert!(state.should_listen());
        state.narrating.store(true, Ordering::SeqCst);
        assert!(!state.should_listen());
    }
}
