//! Hand landmark inference with an ONNX export of the 21-point hand model
//!
//! The model takes a 224x224 RGB image (NHWC, 0..1) and returns 63 floats
//! (x, y, z per keypoint, in input pixels) plus a hand presence score.
//! The whole frame is squeezed into the input, so normalized outputs map
//! straight back onto the frame.

use super::frame::Frame;
use super::landmarks::{DetectError, HandLandmarkDetector, LANDMARK_COUNT, LandmarkSet};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;

const INPUT_SIZE: usize = 224;

pub struct OnnxHandDetector {
    session: Session,
    input_name: String,
    landmarks_output: String,
    presence_output: String,
    min_confidence: f32,
}

impl OnnxHandDetector {
    pub fn load(model_path: impl AsRef<Path>, min_confidence: f32) -> Result<Self, DetectError> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(DetectError::Unavailable(format!("{} not found", model_path.display())));
        }

        let session = create_session(model_path).map_err(|e| DetectError::Unavailable(e.to_string()))?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| DetectError::Unavailable("model has no inputs".into()))?;
        let outputs: Vec<String> = session
            .outputs()
            .iter()
            .map(|output| output.name().to_string())
            .collect();
        if outputs.len() < 2 {
            return Err(DetectError::Unavailable(format!(
                "expected landmark and presence outputs, got {:?}",
                outputs
            )));
        }

        log::info!(
            "[TRACKING] Landmark model {} ({} -> {}, {})",
            model_path.display(),
            input_name,
            outputs[0],
            outputs[1]
        );
        Ok(Self {
            session,
            input_name,
            landmarks_output: outputs[0].clone(),
            presence_output: outputs[1].clone(),
            min_confidence,
        })
    }
}

#[cfg(all(target_arch = "aarch64", target_os = "macos"))]
fn create_session(model_path: &Path) -> ort::Result<Session> {
    use ort::execution_providers::CoreMLExecutionProvider;

    match Session::builder()?.with_execution_providers([CoreMLExecutionProvider::default().build()]) {
        Ok(builder) => builder.commit_from_file(model_path),
        Err(e) => {
            log::warn!("[TRACKING] CoreML unavailable ({}), using CPU", e);
            Session::builder()?.commit_from_file(model_path)
        }
    }
}

#[cfg(not(all(target_arch = "aarch64", target_os = "macos")))]
fn create_session(model_path: &Path) -> ort::Result<Session> {
    Session::builder()?.commit_from_file(model_path)
}

/// Nearest-neighbour resize into a normalized NHWC tensor
fn to_input(frame: &Frame) -> Array4<f32> {
    let mut input = Array4::<f32>::zeros((1, INPUT_SIZE, INPUT_SIZE, 3));
    for y in 0..INPUT_SIZE {
        let sy = (y * frame.height / INPUT_SIZE).min(frame.height.saturating_sub(1));
        for x in 0..INPUT_SIZE {
            let sx = (x * frame.width / INPUT_SIZE).min(frame.width.saturating_sub(1));
            let [r, g, b] = frame.pixel(sx, sy);
            input[[0, y, x, 0]] = r as f32 / 255.0;
            input[[0, y, x, 1]] = g as f32 / 255.0;
            input[[0, y, x, 2]] = b as f32 / 255.0;
        }
    }
    input
}

/// Some exports emit the presence logit rather than a probability
fn presence_probability(raw: f32) -> f32 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        1.0 / (1.0 + (-raw).exp())
    }
}

/// Input-pixel xyz triples to normalized keypoints
fn decode_landmarks(raw: &[f32]) -> Option<LandmarkSet> {
    if raw.len() < LANDMARK_COUNT * 3 {
        return None;
    }
    let pairs: Vec<(f64, f64)> = raw
        .chunks_exact(3)
        .take(LANDMARK_COUNT)
        .map(|p| (p[0] as f64 / INPUT_SIZE as f64, p[1] as f64 / INPUT_SIZE as f64))
        .collect();
    LandmarkSet::from_pairs(&pairs)
}

impl HandLandmarkDetector for OnnxHandDetector {
    #[hotpath::measure]
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, DetectError> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(None);
        }
        let input = Value::from_array(to_input(frame)).map_err(|e| DetectError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs! { self.input_name.as_str() => input })
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let (_, presence) = outputs[self.presence_output.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        let score = presence.first().copied().map(presence_probability).unwrap_or(0.0);
        if score < self.min_confidence {
            return Ok(None);
        }

        let (_, raw) = outputs[self.landmarks_output.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        Ok(decode_landmarks(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarks::INDEX_FINGER_TIP;

    #[test]
    fn test_to_input_samples_corners() {
        let mut frame = Frame::blank(448, 448);
        let last = (447 * 448 + 447) * 3;
        frame.data[0] = 255;
        frame.data[last + 2] = 255;
        let input = to_input(&frame);
        assert_eq!(input.shape(), &[1, INPUT_SIZE, INPUT_SIZE, 3]);
        assert_eq!(input[[0, 0, 0, 0]], 1.0);
        // 223 * 448 / 224 = 446, one short of the far corner
        assert_eq!(input[[0, 223, 223, 2]], 0.0);
    }

    #[test]
    fn test_decode_landmarks() {
        let mut raw = vec![0.0f32; 63];
        raw[INDEX_FINGER_TIP * 3] = 112.0;
        raw[INDEX_FINGER_TIP * 3 + 1] = 56.0;
        let set = decode_landmarks(&raw).unwrap();
        assert_eq!(set.point(INDEX_FINGER_TIP).x, 0.5);
        assert_eq!(set.point(INDEX_FINGER_TIP).y, 0.25);
        assert!(decode_landmarks(&raw[..60]).is_none());
    }

    #[test]
    fn test_presence_probability() {
        assert_eq!(presence_probability(0.8), 0.8);
        assert!(presence_probability(5.0) > 0.99);
        assert!(presence_probability(-5.0) < 0.01);
    }

    #[test]
    fn test_missing_model() {
        let err = OnnxHandDetector::load("models/missing.onnx", 0.7).err().unwrap();
        assert!(matches!(err, DetectError::Unavailable(_)));
    }
}
