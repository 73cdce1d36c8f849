//! Video frames and the capture device that produces them

use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use thiserror::Error;

/// Packed RGB8 image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Option<Self> {
        (data.len() == width * height * 3).then_some(Self { data, width, height })
    }

    /// Solid black frame
    #[cfg(test)]
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height * 3],
            width,
            height,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = (y * self.width + x) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Flip left-right in place
    pub fn mirror(&mut self) {
        let row_len = self.width * 3;
        for row in self.data.chunks_exact_mut(row_len) {
            for x in 0..self.width / 2 {
                let left = x * 3;
                let right = (self.width - 1 - x) * 3;
                for c in 0..3 {
                    row.swap(left + c, right + c);
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },
    #[error("frame read failed: {0}")]
    Read(String),
}

/// A source of sequential frames that owns its device
pub trait FrameSource {
    fn read(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device; later reads fail
    fn close(&mut self);
}

/// Webcam through nokhwa's native backend
pub struct CameraSource {
    camera: Option<Camera>,
    index: u32,
    mirror: bool,
}

impl CameraSource {
    pub fn open(index: u32, mirror: bool) -> Result<Self, CaptureError> {
        let unavailable = |reason: String| CaptureError::DeviceUnavailable { index, reason };

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera =
            Camera::new(CameraIndex::Index(index), requested).map_err(|e| unavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| unavailable(format!("failed to open stream: {}", e)))?;

        log::info!(
            "[CAMERA] Opened {} ({}x{} @ {}fps)",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera: Some(camera),
            index,
            mirror,
        })
    }
}

impl FrameSource for CameraSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| CaptureError::Read(format!("camera {} is closed", self.index)))?;

        let buffer = camera.frame().map_err(|e| CaptureError::Read(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Read(format!("decode: {}", e)))?;

        let (width, height) = (image.width() as usize, image.height() as usize);
        let mut frame = Frame::new(image.into_raw(), width, height)
            .ok_or_else(|| CaptureError::Read("decoded frame has unexpected size".into()))?;
        if self.mirror {
            frame.mirror();
        }
        Ok(frame)
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("[CAMERA] Failed to stop stream: {}", e);
            }
            log::info!("[CAMERA] Camera {} released", self.index);
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.close();
    }
}
