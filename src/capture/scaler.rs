//! Frame rescaling backed by the `image` crate

use super::traits::{Frame, FrameScaler, Resolution};
use crate::recorder::error::{RecordingError, RecordingResult};
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Bilinear scaler.
///
/// The four channels are filtered independently, so the same path serves
/// RGBA and BGRA frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageScaler;

impl FrameScaler for ImageScaler {
    fn resize(&self, frame: Frame, target: Resolution) -> RecordingResult<Frame> {
        if frame.resolution() == target {
            return Ok(frame);
        }
        if target.is_empty() {
            return Err(RecordingError::ConfigurationError(format!(
                "Cannot scale to empty resolution {}",
                target
            )));
        }

        let format = frame.format;
        let (width, height) = (frame.width, frame.height);
        let image = RgbaImage::from_raw(width, height, frame.data).ok_or_else(|| {
            RecordingError::CaptureError(format!(
                "Frame buffer does not match {}x{}",
                width, height
            ))
        })?;

        let scaled = imageops::resize(&image, target.width, target.height, FilterType::Triangle);
        Frame::new(target.width, target.height, format, scaled.into_raw())
    }
}
