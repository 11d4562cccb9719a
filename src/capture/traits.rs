//! Capture trait definitions
//!
//! Platform-agnostic frame types and the capability traits the capture loop
//! is written against.

use crate::recorder::error::{RecordingError, RecordingResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in one frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Byte order of a packed 4-byte pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgba,
    Bgra,
}

impl PixelFormat {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Name FFmpeg uses for this layout in `-pix_fmt`
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            PixelFormat::Rgba => "rgba",
            PixelFormat::Bgra => "bgra",
        }
    }
}

/// One captured or processed video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Channel order of `data`
    pub format: PixelFormat,

    /// Tightly packed pixels, no row padding
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap raw pixels, checking the buffer matches the dimensions
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> RecordingResult<Self> {
        let expected = width as usize * height as usize * PixelFormat::BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(RecordingError::CaptureError(format!(
                "Frame size mismatch: got {} bytes, expected {} ({}x{}x4)",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Reorder channels so the frame matches `target`.
    ///
    /// RGBA and BGRA differ only in the R and B positions, so the conversion
    /// is the same swap in both directions.
    pub fn into_format(mut self, target: PixelFormat) -> Self {
        if self.format != target {
            for pixel in self.data.chunks_exact_mut(PixelFormat::BYTES_PER_PIXEL) {
                pixel.swap(0, 2);
            }
            self.format = target;
        }
        self
    }
}

/// A source of full-screen frames.
///
/// Each call grabs the whole screen once. Implementations are used from the
/// capture thread only.
pub trait ScreenCapturer: Send {
    fn capture_frame(&mut self) -> RecordingResult<Frame>;
}

/// Opens capturers and reports the display they cover
pub trait CaptureProvider: Send + Sync {
    /// Pixel size of the display that will be captured
    fn display_size(&self) -> RecordingResult<Resolution>;

    /// Create a capturer for one session
    fn open_capturer(&self) -> RecordingResult<Box<dyn ScreenCapturer>>;
}

/// Rescales frames to the session resolution
pub trait FrameScaler: Send + Sync {
    fn resize(&self, frame: Frame, target: Resolution) -> RecordingResult<Frame>;
}
