use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub typing: TypingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            speech: SpeechConfig::default(),
            tts: TtsConfig::default(),
            tracking: TrackingConfig::default(),
            typing: TypingConfig::default(),
        }
    }
}

fn default_name() -> String {
    "Personal Assistant".into()
}

// ============================================================================
// Speech Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Directory of the Parakeet transcription model
    #[serde(default = "default_transcriber_model")]
    pub model_path: String,
    /// Silero VAD model; energy-based detection is used when missing
    #[serde(default = "default_vad_model")]
    pub vad_model_path: String,
    /// Silence that ends an utterance (ms)
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u32,
    /// Longest utterance kept before it is cut and transcribed (ms)
    #[serde(default = "default_phrase_limit_ms")]
    pub phrase_limit_ms: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model_path: default_transcriber_model(),
            vad_model_path: default_vad_model(),
            silence_ms: default_silence_ms(),
            phrase_limit_ms: default_phrase_limit_ms(),
        }
    }
}

fn default_transcriber_model() -> String {
    "models/parakeet-tdt-0.6b-v3-int8".into()
}

fn default_vad_model() -> String {
    "models/silero_vad_v4.onnx".into()
}

fn default_silence_ms() -> u32 {
    450
}

fn default_phrase_limit_ms() -> u32 {
    2000
}

// ============================================================================
// Tracking Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// Logical capture device index
    #[serde(default)]
    pub camera_index: u32,
    /// Mirror frames horizontally so hand motion matches cursor motion
    #[serde(default = "default_mirror")]
    pub mirror: bool,
    /// Exponential smoothing factor, must be in (0, 1)
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Pinch distance in frame pixels below which a click fires
    #[serde(default = "default_click_threshold")]
    pub click_threshold_px: f64,
    /// Minimum time between two clicks (ms)
    #[serde(default = "default_click_cooldown")]
    pub click_cooldown_ms: u64,
    /// Phrase that ends a session when heard
    #[serde(default = "default_stop_phrase")]
    pub stop_phrase: String,
    /// Longest wait for a recognition result per tick (ms); 0 never blocks
    #[serde(default)]
    pub voice_poll_ms: u64,
    /// Feedback window title
    #[serde(default = "default_window_title")]
    pub window_title: String,
    /// Feedback window refresh cap
    #[serde(default = "default_target_fps")]
    pub target_fps: usize,
    /// Hand landmark ONNX model
    #[serde(default = "default_landmark_model")]
    pub model_path: String,
    /// Hand presence score required to accept a detection
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mirror: default_mirror(),
            smoothing: default_smoothing(),
            click_threshold_px: default_click_threshold(),
            click_cooldown_ms: default_click_cooldown(),
            stop_phrase: default_stop_phrase(),
            voice_poll_ms: 0,
            window_title: default_window_title(),
            target_fps: default_target_fps(),
            model_path: default_landmark_model(),
            min_confidence: default_min_confidence(),
        }
    }
}

/// Longest per-tick wait for a recognition result
pub const MAX_VOICE_POLL_MS: u64 = 2000;

impl TrackingConfig {
    /// Replace out-of-range values with their defaults
    pub fn validated(mut self) -> Self {
        if !(self.smoothing > 0.0 && self.smoothing < 1.0) {
            log::warn!(
                "[CONFIG] tracking.smoothing must be in (0, 1), got {}; using {}",
                self.smoothing,
                default_smoothing()
            );
            self.smoothing = default_smoothing();
        }
        if !(self.click_threshold_px > 0.0) {
            log::warn!(
                "[CONFIG] tracking.click_threshold_px must be positive, got {}; using {}",
                self.click_threshold_px,
                default_click_threshold()
            );
            self.click_threshold_px = default_click_threshold();
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            log::warn!(
                "[CONFIG] tracking.min_confidence must be in [0, 1], got {}; using {}",
                self.min_confidence,
                default_min_confidence()
            );
            self.min_confidence = default_min_confidence();
        }
        if self.voice_poll_ms > MAX_VOICE_POLL_MS {
            log::warn!(
                "[CONFIG] tracking.voice_poll_ms would stall every tick, got {}; using {}",
                self.voice_poll_ms,
                MAX_VOICE_POLL_MS
            );
            self.voice_poll_ms = MAX_VOICE_POLL_MS;
        }
        if self.stop_phrase.trim().is_empty() {
            self.stop_phrase = default_stop_phrase();
        }
        self
    }

    pub fn click_cooldown(&self) -> Duration {
        Duration::from_millis(self.click_cooldown_ms)
    }

    pub fn voice_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.voice_poll_ms)
    }
}

fn default_mirror() -> bool {
    true
}

fn default_smoothing() -> f64 {
    0.2
}

fn default_click_threshold() -> f64 {
    30.0
}

fn default_click_cooldown() -> u64 {
    200
}

fn default_stop_phrase() -> String {
    "stop hand tracking".into()
}

fn default_window_title() -> String {
    "Hand Tracking".into()
}

fn default_target_fps() -> usize {
    30
}

fn default_landmark_model() -> String {
    "models/hand_landmark.onnx".into()
}

fn default_min_confidence() -> f32 {
    0.7
}

// ============================================================================
// Typing Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct TypingConfig {
    /// Input method: "direct" or "clipboard"
    #[serde(default = "default_input_method")]
    pub input_method: String,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            input_method: default_input_method(),
        }
    }
}

fn default_input_method() -> String {
    "direct".into()
}

// ============================================================================
// TTS Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "engine")]
#[allow(dead_code)]
pub enum TtsConfig {
    /// Print narration to the terminal only
    #[serde(rename = "console")]
    Console,
    #[serde(rename = "kokoro")]
    Kokoro {
        #[serde(default = "default_kokoro_model")]
        model: String,
        #[serde(default = "default_kokoro_voices")]
        voices: String,
        #[serde(default = "default_kokoro_style")]
        style: String,
        #[serde(default = "default_tts_speed")]
        speed: f32,
        #[serde(default = "default_tts_volume")]
        volume: f32,
    },
}

impl Default for TtsConfig {
    fn default() -> Self {
        #[cfg(feature = "kokoro")]
        {
            TtsConfig::Kokoro {
                model: default_kokoro_model(),
                voices: default_kokoro_voices(),
                style: default_kokoro_style(),
                speed: default_tts_speed(),
                volume: default_tts_volume(),
            }
        }
        #[cfg(not(feature = "kokoro"))]
        {
            TtsConfig::Console
        }
    }
}

fn default_kokoro_model() -> String {
    "models/kokoro-v1.0.onnx".into()
}
fn default_kokoro_voices() -> String {
    "models/voices-v1.0.bin".into()
}
fn default_kokoro_style() -> String {
    "af_heart".into()
}
fn default_tts_speed() -> f32 {
    1.0
}
fn default_tts_volume() -> f32 {
    0.9
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(s) => Self::parse(&s).unwrap_or_else(|e| {
                    log::warn!("[CONFIG] {} is invalid ({}), using defaults", path.display(), e);
                    Config::default()
                }),
                Err(e) => {
                    log::warn!("[CONFIG] Cannot read {} ({}), using defaults", path.display(), e);
                    Config::default()
                }
            }
        } else {
            log::debug!("[CONFIG] {} not found, using defaults", path.display());
            Config::default()
        };

        Self {
            tracking: config.tracking.validated(),
            ..config
        }
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tracking.camera_index, 0);
        assert_eq!(config.tracking.smoothing, 0.2);
        assert_eq!(config.tracking.click_threshold_px, 30.0);
        assert_eq!(config.tracking.stop_phrase, "stop hand tracking");
        assert_eq!(config.tracking.click_cooldown(), Duration::from_millis(200));
        assert_eq!(config.speech.phrase_limit_ms, 2000);
    }

    #[test]
    fn test_parse_partial() {
        let config = Config::parse(
            r#"
            name = "Jarvis"

            [tracking]
            smoothing = 0.5
            camera_index = 2

            [tts]
            engine = "console"
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "Jarvis");
        assert_eq!(config.tracking.smoothing, 0.5);
        assert_eq!(config.tracking.camera_index, 2);
        assert!(config.tracking.mirror);
        assert!(matches!(config.tts, TtsConfig::Console));
        assert_eq!(config.typing.input_method, "direct");
    }

    #[test]
    fn test_validated_replaces_bad_values() {
        let tracking = TrackingConfig {
            smoothing: 1.5,
            click_threshold_px: -3.0,
            min_confidence: 4.0,
            stop_phrase: "  ".into(),
            ..TrackingConfig::default()
        }
        .validated();
        assert_eq!(tracking.smoothing, 0.2);
        assert_eq!(tracking.click_threshold_px, 30.0);
        assert_eq!(tracking.min_confidence, 0.7);
        assert_eq!(tracking.stop_phrase, "stop hand tracking");
    }

    #[test]
    fn test_validated_bounds_voice_poll() {
        let tracking = TrackingConfig {
            voice_poll_ms: 60_000,
            ..TrackingConfig::default()
        }
        .validated();
        assert_eq!(tracking.voice_poll_timeout(), Duration::from_millis(MAX_VOICE_POLL_MS));

        let tracking = TrackingConfig {
            voice_poll_ms: 150,
            ..TrackingConfig::default()
        }
        .validated();
        assert_eq!(tracking.voice_poll_ms, 150);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("does/not/exist.toml");
        assert_eq!(config.name, "Personal Assistant");
    }
}
