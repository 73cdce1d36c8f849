//! Voice listener - microphone capture, utterance segmentation and transcription
//!
//! Runs on its own thread for the lifetime of the process and publishes one
//! [`Recognition`] per utterance. Consumers (the assistant loop, or the voice
//! exit check of a hand-tracking session) drain the channel at their own pace.

use crate::audio::{self, TARGET_RATE, UtteranceSegmenter};
use crate::config::SpeechConfig;
use crate::state::SharedState;
use crate::transcriber::Transcriber;
use crate::vad::VadEngine;
use flume::{Receiver, Sender, TrySendError};
use std::thread;

/// Outcome of transcribing one utterance
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// Non-empty transcript
    Recognized(String),
    /// Speech was heard but nothing intelligible came out
    Ambiguous,
    /// No recognizer or microphone is available
    ServiceUnavailable,
}

impl Recognition {
    pub fn from_transcript(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            Recognition::Ambiguous
        } else {
            Recognition::Recognized(text.to_string())
        }
    }

    /// Case-insensitive substring match against a recognized transcript
    pub fn mentions(&self, phrase: &str) -> bool {
        match self {
            Recognition::Recognized(text) => text
                .to_lowercase()
                .contains(&phrase.trim().to_lowercase()),
            _ => false,
        }
    }
}

/// Turns one utterance into a recognition result
pub trait SpeechRecognizer {
    fn recognize(&mut self, samples: &[f32]) -> Recognition;
}

/// Start the background voice listener
///
/// Returns the receiving end of a single-slot channel. If the microphone cannot
/// be opened the listener reports `ServiceUnavailable` once and exits, which
/// disconnects the channel.
pub fn spawn_listener(config: &SpeechConfig, state: SharedState) -> Result<Receiver<Recognition>, String> {
    let (tx, rx) = flume::bounded(1);
    let config = config.clone();

    thread::Builder::new()
        .name("voice-listener".to_string())
        .spawn(move || {
            let (frame_tx, frame_rx) = flume::unbounded::<Vec<f32>>();
            // The stream must outlive the loop below
            let _stream = match audio::start_capture(frame_tx) {
                Ok(stream) => stream,
                Err(e) => {
                    log::error!("[VOICE] Microphone unavailable: {}", e);
                    let _ = tx.send(Recognition::ServiceUnavailable);
                    return;
                }
            };

            let vad = VadEngine::load(&config.vad_model_path, TARGET_RATE);
            log::info!("[VOICE] Listening with {} VAD", vad.name());
            let segmenter = UtteranceSegmenter::new(vad, config.silence_ms, config.phrase_limit_ms);
            let recognizer: Option<Box<dyn SpeechRecognizer>> =
                match Transcriber::new(&config.model_path) {
                    Ok(t) => Some(Box::new(t)),
                    Err(e) => {
                        log::error!("[VOICE] Transcriber failed to load: {}", e);
                        None
                    }
                };

            run_listener(frame_rx, segmenter, recognizer, tx, state);
            log::debug!("[VOICE] Listener stopped");
        })
        .map_err(|e| format!("Failed to spawn voice listener: {}", e))?;

    Ok(rx)
}

/// Listener loop: segment frames into utterances and publish their recognition
///
/// Returns when the frame source or every receiver goes away.
pub fn run_listener(
    frames: Receiver<Vec<f32>>,
    mut segmenter: UtteranceSegmenter,
    mut recognizer: Option<Box<dyn SpeechRecognizer>>,
    tx: Sender<Recognition>,
    state: SharedState,
) {
    let mut muted = false;

    while let Ok(frame) = frames.recv() {
        if !state.should_listen() {
            if !muted {
                segmenter.reset();
                muted = true;
            }
            continue;
        }
        muted = false;

        let Some(utterance) = segmenter.push(&frame) else {
            continue;
        };

        let result = match recognizer.as_mut() {
            Some(r) => r.recognize(&utterance),
            None => Recognition::ServiceUnavailable,
        };
        log::debug!(
            "[VOICE] {:.1}s utterance -> {:?}",
            utterance.len() as f32 / TARGET_RATE as f32,
            result
        );

        match tx.try_send(result) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                log::debug!("[VOICE] Consumer busy, dropped {:?}", dropped);
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
}
