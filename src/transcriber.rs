use std::path::Path;
use transcribe_rs::{
    TranscriptionEngine,
    engines::parakeet::{ParakeetEngine, ParakeetModelParams},
};

use crate::speech::{Recognition, SpeechRecognizer};

pub struct Transcriber {
    engine: ParakeetEngine,
}

impl Transcriber {
    pub fn new(
        model_path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut engine = ParakeetEngine::new();
        log::info!("[VOICE] Loading model {}...", model_path.as_ref().display());
        engine
            .load_model_with_params(model_path.as_ref(), ParakeetModelParams::int8())
            .map_err(|e| e.to_string())?;
        log::info!("[VOICE] Model loaded.");
        Ok(Self { engine })
    }

    #[hotpath::measure]
    pub fn transcribe(
        &mut self,
        samples: &[f32],
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let result = self
            .engine
            .transcribe_samples(samples.to_vec(), None)
            .map_err(|e| e.to_string())?;
        Ok(result.text.trim().to_string())
    }
}

impl SpeechRecognizer for Transcriber {
    fn recognize(&mut self, samples: &[f32]) -> Recognition {
        match self.transcribe(samples) {
            Ok(text) => Recognition::from_transcript(&text),
            Err(e) => {
                log::debug!("[VOICE] Transcription failed: {}", e);
                Recognition::Ambiguous
            }
        }
    }
}
