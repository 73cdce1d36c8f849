//! Session termination: keyboard, voice and window close folded into one decision per tick

use crate::speech::Recognition;
use crate::state::SharedState;
use flume::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    None,
    KeyboardEscape,
    VoiceStop,
    WindowClose,
}

impl ExitSignal {
    pub fn is_exit(&self) -> bool {
        !matches!(self, ExitSignal::None)
    }
}

pub trait KeyboardProbe {
    /// Non-blocking check of the emergency key
    fn escape_pressed(&mut self) -> bool;
}

pub trait VoiceProbe {
    /// Bounded check for the stop phrase
    fn stop_heard(&mut self) -> bool;
}

/// Emergency key as seen by the global hook
pub struct EscapeKey {
    state: SharedState,
}

impl EscapeKey {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl KeyboardProbe for EscapeKey {
    fn escape_pressed(&mut self) -> bool {
        self.state.take_escape()
    }
}

/// Watches the recognition channel for the stop phrase
pub struct VoiceStop {
    rx: Option<Receiver<Recognition>>,
    phrase: String,
    timeout: Duration,
}

impl VoiceStop {
    /// Results already queued belong to the previous mode and are discarded
    pub fn new(rx: Option<Receiver<Recognition>>, phrase: &str, timeout: Duration) -> Self {
        if let Some(rx) = &rx {
            let stale = rx.drain().count();
            if stale > 0 {
                log::debug!("[TRACKING] Discarded {} queued recognitions", stale);
            }
        }
        Self {
            rx,
            phrase: phrase.to_string(),
            timeout,
        }
    }

    fn disconnect(&mut self) {
        log::warn!("[TRACKING] Voice listener gone, voice stop disabled");
        self.rx = None;
    }
}

impl VoiceProbe for VoiceStop {
    fn stop_heard(&mut self) -> bool {
        let Some(rx) = &self.rx else {
            return false;
        };

        let mut heard = Vec::new();
        let mut disconnected = false;

        if !self.timeout.is_zero() {
            match rx.recv_timeout(self.timeout) {
                Ok(r) => heard.push(r),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => disconnected = true,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(r) => heard.push(r),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            self.disconnect();
        }

        heard.iter().any(|r| {
            if let Recognition::Recognized(text) = r {
                log::debug!("[TRACKING] Heard {:?}", text);
            }
            r.mentions(&self.phrase)
        })
    }
}

pub struct ExitArbiter {
    keyboard: Box<dyn KeyboardProbe>,
    voice: Box<dyn VoiceProbe>,
}

impl ExitArbiter {
    pub fn new(keyboard: Box<dyn KeyboardProbe>, voice: Box<dyn VoiceProbe>) -> Self {
        Self { keyboard, voice }
    }

    /// Keyboard, then voice, then window; the first one to fire wins
    pub fn poll(&mut self, window_closed: impl FnOnce() -> bool) -> ExitSignal {
        if self.keyboard.escape_pressed() {
            ExitSignal::KeyboardEscape
        } else if self.voice.stop_heard() {
            ExitSignal::VoiceStop
        } else if window_closed() {
            ExitSignal::WindowClose
        } else {
            ExitSignal::None
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::state::RuntimeState;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Probe with a fixed answer that counts how often it was asked
    #[derive(Clone, Default)]
    pub struct Fixed {
        pub answer: Rc<Cell<bool>>,
        pub calls: Rc<Cell<u32>>,
    }

    impl Fixed {
        pub fn firing(answer: bool) -> Self {
            let probe = Self::default();
            probe.answer.set(answer);
            probe
        }

        fn ask(&self) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.answer.get()
        }
    }

    impl KeyboardProbe for Fixed {
        fn escape_pressed(&mut self) -> bool {
            self.ask()
        }
    }

    impl VoiceProbe for Fixed {
        fn stop_heard(&mut self) -> bool {
            self.ask()
        }
    }

    #[test]
    fn test_keyboard_wins_and_short_circuits() {
        let voice = Fixed::firing(true);
        let mut arbiter = ExitArbiter::new(Box::new(Fixed::firing(true)), Box::new(voice.clone()));
        let mut window_asked = false;
        let signal = arbiter.poll(|| {
            window_asked = true;
            true
        });
        assert_eq!(signal, ExitSignal::KeyboardEscape);
        assert_eq!(voice.calls.get(), 0);
        assert!(!window_asked);
    }

    #[test]
    fn test_priority_order() {
        let mut arbiter = ExitArbiter::new(Box::new(Fixed::firing(false)), Box::new(Fixed::firing(true)));
        assert_eq!(arbiter.poll(|| true), ExitSignal::VoiceStop);

        let mut arbiter = ExitArbiter::new(Box::new(Fixed::firing(false)), Box::new(Fixed::firing(false)));
        assert_eq!(arbiter.poll(|| true), ExitSignal::WindowClose);
        assert_eq!(arbiter.poll(|| false), ExitSignal::None);
        assert!(!ExitSignal::None.is_exit());
    }

    #[test]
    fn test_escape_key_probe_uses_latch() {
        let state = RuntimeState::new();
        let mut probe = EscapeKey::new(state.clone());
        assert!(!probe.escape_pressed());
        state.set_escape(true);
        state.set_escape(false);
        assert!(probe.escape_pressed());
        assert!(!probe.escape_pressed());
    }

    #[test]
    fn test_voice_stop_matches_phrase() {
        let (tx, rx) = flume::unbounded();
        let mut probe = VoiceStop::new(Some(rx), "stop hand tracking", Duration::ZERO);

        tx.send(Recognition::Ambiguous).unwrap();
        tx.send(Recognition::Recognized("Open the door".into())).unwrap();
        assert!(!probe.stop_heard());

        tx.send(Recognition::ServiceUnavailable).unwrap();
        tx.send(Recognition::Recognized("Please STOP hand tracking.".into())).unwrap();
        assert!(probe.stop_heard());
        assert!(!probe.stop_heard());
    }

    #[test]
    fn test_voice_stop_discards_stale_results() {
        let (tx, rx) = flume::unbounded();
        tx.send(Recognition::Recognized("stop hand tracking".into())).unwrap();
        let mut probe = VoiceStop::new(Some(rx), "stop hand tracking", Duration::ZERO);
        assert!(!probe.stop_heard());
    }

    #[test]
    fn test_voice_stop_timeout_and_disconnect() {
        let (tx, rx) = flume::unbounded::<Recognition>();
        let mut probe = VoiceStop::new(Some(rx), "stop hand tracking", Duration::from_millis(5));
        assert!(!probe.stop_heard());

        drop(tx);
        assert!(!probe.stop_heard());
        assert!(probe.rx.is_none());

        let mut none = VoiceStop::new(None, "stop hand tracking", Duration::ZERO);
        assert!(!none.stop_heard());
    }
}
