use std::path::Path;
use vad_rs::Vad;

const VAD_THRESHOLD: f32 = 0.3;
const VAD_THRESHOLD_END: f32 = 0.25;
const ENERGY_THRESHOLD: f32 = 0.01;
const ENERGY_THRESHOLD_END: f32 = 0.006;

pub enum VadEngine {
    Silero(Vad),
    Energy,
}

impl VadEngine {
    /// Silero when the model loads, energy-based detection otherwise
    pub fn load(model_path: &str, sample_rate: usize) -> Self {
        if !Path::new(model_path).exists() {
            log::info!("[VAD] {} not found, using energy-based detection", model_path);
            return VadEngine::Energy;
        }
        match Vad::new(model_path, sample_rate) {
            Ok(vad) => {
                log::info!("[VAD] Silero enabled");
                VadEngine::Silero(vad)
            }
            Err(e) => {
                log::warn!("[VAD] Silero failed ({}), using energy-based detection", e);
                VadEngine::Energy
            }
        }
    }

    pub fn energy() -> Self {
        VadEngine::Energy
    }

    pub fn is_speech(&mut self, frame: &[f32], currently_speaking: bool) -> bool {
        let threshold = match (&*self, currently_speaking) {
            (VadEngine::Silero(_), false) => VAD_THRESHOLD,
            (VadEngine::Silero(_), true) => VAD_THRESHOLD_END,
            (VadEngine::Energy, false) => ENERGY_THRESHOLD,
            (VadEngine::Energy, true) => ENERGY_THRESHOLD_END,
        };

        match self {
            VadEngine::Silero(vad) => vad
                .compute(frame)
                .map(|r| r.prob > threshold)
                .unwrap_or(false),
            VadEngine::Energy => rms(frame) > threshold,
        }
    }

    pub fn reset(&mut self) {
        if let VadEngine::Silero(vad) = self {
            vad.reset();
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VadEngine::Silero(_) => "Silero",
            VadEngine::Energy => "Energy",
        }
    }
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_hysteresis() {
        let mut vad = VadEngine::energy();
        // rms 0.008 sits between the start and end thresholds
        let frame = vec![0.008; 480];
        assert!(!vad.is_speech(&frame, false));
        assert!(vad.is_speech(&frame, true));
    }

    #[test]
    fn test_empty_frame_is_silence() {
        let mut vad = VadEngine::energy();
        assert!(!vad.is_speech(&[], false));
    }

    #[test]
    fn test_missing_model_falls_back() {
        let vad = VadEngine::load("models/missing.onnx", 16000);
        assert_eq!(vad.name(), "Energy");
    }
}
