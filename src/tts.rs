//! Narration - short status phrases spoken (or printed) to the user

use crate::config::TtsConfig;
use crate::state::SharedState;
use crate::ui;
use rodio::{OutputStreamBuilder, Sink};
use std::sync::Arc;
use std::sync::atomic::Ordering;

pub trait TtsEngine: Send + Sync {
    fn synthesize(&self, text: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>>;
}

/// Anything that can announce status text
///
/// Narration blocks until finished so the voice listener does not pick up
/// the assistant's own voice.
pub trait Narrator: Send + Sync {
    fn say(&self, text: &str);
}

pub type SharedNarrator = Arc<dyn Narrator>;

/// Prints narration to the terminal
pub struct ConsoleNarrator;

impl Narrator for ConsoleNarrator {
    fn say(&self, text: &str) {
        ui::narration(text);
    }
}

// ============================================================================
// Kokoro TTS Engine
// ============================================================================

#[cfg(feature = "kokoro")]
pub struct KokoroEngine {
    engine: kokoros::tts::koko::TTSKoko,
    style: String, // Good choices: af_heart af_bella af_nova bf_emma am_adam am_michael am_liam
    speed: f32,
}

#[cfg(feature = "kokoro")]
impl KokoroEngine {
    pub async fn new(model_path: &str, voices_path: &str, style: &str, speed: f32) -> Self {
        Self {
            engine: kokoros::tts::koko::TTSKoko::new(model_path, voices_path).await,
            style: style.to_string(),
            speed,
        }
    }
}

#[cfg(feature = "kokoro")]
impl TtsEngine for KokoroEngine {
    fn synthesize(&self, text: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
        let audio = self.engine.tts_raw_audio(
            text,
            "en-us",
            &self.style,
            self.speed,
            None,
            None,
            None,
            None,
        )?;
        Ok((audio, 24000))
    }
}

// ============================================================================
// Spoken narration
// ============================================================================

#[cfg_attr(not(feature = "kokoro"), allow(dead_code))]
pub struct Tts {
    engine: Box<dyn TtsEngine>,
    state: SharedState,
    volume: f32,
}

#[cfg_attr(not(feature = "kokoro"), allow(dead_code))]
impl Tts {
    pub fn new(engine: Box<dyn TtsEngine>, state: SharedState, volume: f32) -> Self {
        Self {
            engine,
            state,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    #[hotpath::measure]
    pub fn speak(&self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        let (audio, sample_rate) = self.engine.synthesize(text)?;
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(self.volume);
        sink.append(rodio::buffer::SamplesBuffer::new(1, sample_rate, audio));

        self.state.narrating.store(true, Ordering::SeqCst);
        sink.sleep_until_end();
        self.state.narrating.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Narrator for Tts {
    fn say(&self, text: &str) {
        ui::narration(text);
        if let Err(e) = self.speak(text) {
            log::warn!("[TTS] Playback failed: {}", e);
        }
    }
}

/// Build the narrator selected in config, falling back to the console
pub async fn build_narrator(config: &TtsConfig, state: SharedState) -> SharedNarrator {
    match config {
        TtsConfig::Console => Arc::new(ConsoleNarrator),
        #[cfg(feature = "kokoro")]
        TtsConfig::Kokoro {
            model,
            voices,
            style,
            speed,
            volume,
        } => {
            log::info!("[TTS] Loading Kokoro ({})", style);
            let engine = KokoroEngine::new(model, voices, style, *speed).await;
            Arc::new(Tts::new(Box::new(engine), state, *volume))
        }
        #[cfg(not(feature = "kokoro"))]
        TtsConfig::Kokoro { .. } => {
            let _ = state;
            log::warn!("[TTS] Built without the kokoro feature, narrating to the console");
            Arc::new(ConsoleNarrator)
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records narration for assertions
    #[derive(Default)]
    pub struct RecordingNarrator {
        pub lines: Mutex<Vec<String>>,
    }

    impl RecordingNarrator {
        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Narrator for RecordingNarrator {
        fn say(&self, text: &str) {
            self.lines.lock().unwrap().push(text.to_string());
        }
    }

    #[tokio::test]
    async fn test_console_config_builds_console_narrator() {
        let narrator = build_narrator(&TtsConfig::Console, crate::state::RuntimeState::new()).await;
        narrator.say("hello");
    }

    #[test]
    fn test_recording_narrator() {
        let narrator = RecordingNarrator::default();
        narrator.say("one");
        narrator.say("two");
        assert_eq!(narrator.lines(), vec!["one", "two"]);
    }
}
