use cpal::Stream;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use flume::Sender;
use rubato::{FftFixedIn, Resampler};
use std::collections::VecDeque;

use crate::vad::VadEngine;

pub const TARGET_RATE: usize = 16000;
const RESAMPLE_CHUNK: usize = 1024;

// VAD settings - 30ms frames at 16kHz = 480 samples
pub const VAD_FRAME_SAMPLES: usize = 480;
const VAD_MIN_SPEECH_SAMPLES: usize = TARGET_RATE / 4;
const VAD_PREFILL_FRAMES: usize = 10;
const VAD_ONSET_FRAMES: usize = 3;

struct FrameResampler {
    resampler: Option<FftFixedIn<f32>>,
    in_buf: Vec<f32>,
    pending: Vec<f32>,
    frame_samples: usize,
}

impl FrameResampler {
    fn new(
        in_hz: usize,
        out_hz: usize,
        frame_samples: usize,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let resampler = if in_hz != out_hz {
            Some(FftFixedIn::<f32>::new(in_hz, out_hz, RESAMPLE_CHUNK, 1, 1)?)
        } else {
            None
        };
        Ok(Self {
            resampler,
            in_buf: Vec::with_capacity(RESAMPLE_CHUNK),
            pending: Vec::with_capacity(frame_samples),
            frame_samples,
        })
    }

    fn push(&mut self, src: &[f32], mut emit: impl FnMut(&[f32])) {
        let Some(resampler) = self.resampler.as_mut() else {
            self.emit_frames_from(src, &mut emit);
            return;
        };

        self.in_buf.extend_from_slice(src);

        let mut resampled = Vec::new();
        while self.in_buf.len() >= RESAMPLE_CHUNK {
            let chunk: Vec<f32> = self.in_buf.drain(..RESAMPLE_CHUNK).collect();
            if let Ok(out) = resampler.process(&[&chunk], None) {
                resampled.extend_from_slice(&out[0]);
            }
        }
        self.emit_frames_from(&resampled, &mut emit);
    }

    fn emit_frames_from(&mut self, data: &[f32], emit: &mut impl FnMut(&[f32])) {
        self.pending.extend_from_slice(data);

        while self.pending.len() >= self.frame_samples {
            let frame: Vec<f32> = self.pending.drain(..self.frame_samples).collect();
            emit(&frame);
        }
    }
}

/// Start audio capture - sends mono 16kHz frames of `VAD_FRAME_SAMPLES` to channel
///
/// The returned stream must stay alive on the calling thread for capture to continue.
pub fn start_capture(tx: Sender<Vec<f32>>) -> Result<Stream, Box<dyn std::error::Error + Send + Sync>> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or("No input device")?;
    let supported = device.default_input_config()?;
    let input_rate = supported.sample_rate() as usize;
    let channels = supported.channels() as usize;

    log::info!(
        "[AUDIO] {}Hz {}ch -> {}Hz mono",
        input_rate,
        channels,
        TARGET_RATE
    );

    let mut resampler = FrameResampler::new(input_rate, TARGET_RATE, VAD_FRAME_SAMPLES)?;

    let stream = device.build_input_stream(
        &supported.config(),
        move |data: &[f32], _| {
            // Convert to mono
            let mono: Vec<f32> = if channels == 1 {
                data.to_vec()
            } else {
                data.chunks(channels)
                    .map(|c| c.iter().sum::<f32>() / channels as f32)
                    .collect()
            };

            resampler.push(&mono, |frame| {
                let _ = tx.send(frame.to_vec());
            });
        },
        |err| log::error!("[AUDIO] Stream error: {}", err),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VadState {
    Idle,
    Onset(usize),
    Speaking(usize),
}

/// Cuts a stream of VAD frames into utterances
///
/// An utterance starts after a short run of speech frames (with a little
/// pre-roll kept) and ends on trailing silence or when the phrase limit is hit.
pub struct UtteranceSegmenter {
    vad: VadEngine,
    state: VadState,
    speech_buf: Vec<f32>,
    prefill_buf: VecDeque<Vec<f32>>,
    silence_frames_to_end: usize,
    max_samples: usize,
}

impl UtteranceSegmenter {
    pub fn new(vad: VadEngine, silence_ms: u32, phrase_limit_ms: u32) -> Self {
        let frame_ms = (VAD_FRAME_SAMPLES * 1000 / TARGET_RATE) as u32;
        let max_samples = TARGET_RATE * phrase_limit_ms as usize / 1000;
        Self {
            vad,
            state: VadState::Idle,
            speech_buf: Vec::with_capacity(max_samples),
            prefill_buf: VecDeque::with_capacity(VAD_PREFILL_FRAMES + 1),
            silence_frames_to_end: (silence_ms / frame_ms).max(1) as usize,
            max_samples,
        }
    }

    /// Feed one frame; returns a finished utterance when one ends
    pub fn push(&mut self, frame: &[f32]) -> Option<Vec<f32>> {
        let is_speaking = matches!(self.state, VadState::Speaking(_));
        let is_speech = self.vad.is_speech(frame, is_speaking);

        match &mut self.state {
            VadState::Idle => {
                self.prefill_buf.push_back(frame.to_vec());
                if self.prefill_buf.len() > VAD_PREFILL_FRAMES {
                    self.prefill_buf.pop_front();
                }
                if is_speech {
                    self.state = VadState::Onset(1);
                }
            }
            VadState::Onset(count) => {
                self.prefill_buf.push_back(frame.to_vec());
                if self.prefill_buf.len() > VAD_PREFILL_FRAMES {
                    self.prefill_buf.pop_front();
                }
                if is_speech {
                    *count += 1;
                    if *count >= VAD_ONSET_FRAMES {
                        for pf in self.prefill_buf.drain(..) {
                            self.speech_buf.extend_from_slice(&pf);
                        }
                        self.state = VadState::Speaking(0);
                    }
                } else {
                    self.state = VadState::Idle;
                }
            }
            VadState::Speaking(silence_count) => {
                self.speech_buf.extend_from_slice(frame);
                if is_speech {
                    *silence_count = 0;
                } else {
                    *silence_count += 1;
                }
            }
        }

        let should_emit = match self.state {
            VadState::Speaking(silence) => {
                silence >= self.silence_frames_to_end || self.speech_buf.len() >= self.max_samples
            }
            _ => false,
        };
        if !should_emit {
            return None;
        }

        self.state = VadState::Idle;
        self.vad.reset();
        if self.speech_buf.len() >= VAD_MIN_SPEECH_SAMPLES {
            Some(std::mem::take(&mut self.speech_buf))
        } else {
            self.speech_buf.clear();
            None
        }
    }

    /// Drop any partial utterance (e.g. audio captured while narrating)
    pub fn reset(&mut self) {
        self.state = VadState::Idle;
        self.speech_buf.clear();
        self.prefill_buf.clear();
        self.vad.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud() -> Vec<f32> {
        vec![0.5; VAD_FRAME_SAMPLES]
    }

    fn quiet() -> Vec<f32> {
        vec![0.0; VAD_FRAME_SAMPLES]
    }

    #[test]
    fn test_utterance_ends_on_silence() {
        let mut seg = UtteranceSegmenter::new(VadEngine::energy(), 300, 2000);
        let mut out = None;
        for _ in 0..20 {
            assert!(seg.push(&loud()).is_none());
        }
        for _ in 0..20 {
            if let Some(u) = seg.push(&quiet()) {
                out = Some(u);
                break;
            }
        }
        let utterance = out.expect("utterance should end after silence");
        assert!(utterance.len() >= 20 * VAD_FRAME_SAMPLES);
    }

    #[test]
    fn test_utterance_cut_at_phrase_limit() {
        let mut seg = UtteranceSegmenter::new(VadEngine::energy(), 300, 600);
        let mut emitted = 0;
        for _ in 0..100 {
            if let Some(u) = seg.push(&loud()) {
                assert!(u.len() <= 600 * TARGET_RATE / 1000 + VAD_PREFILL_FRAMES * VAD_FRAME_SAMPLES);
                emitted += 1;
            }
        }
        assert!(emitted >= 2);
    }

    #[test]
    fn test_short_blip_is_ignored() {
        let mut seg = UtteranceSegmenter::new(VadEngine::energy(), 60, 2000);
        for _ in 0..3 {
            seg.push(&loud());
        }
        for _ in 0..30 {
            assert!(seg.push(&quiet()).is_none());
        }
    }

    #[test]
    fn test_silence_only() {
        let mut seg = UtteranceSegmenter::new(VadEngine::energy(), 300, 2000);
        for _ in 0..100 {
            assert!(seg.push(&quiet()).is_none());
        }
    }
}
