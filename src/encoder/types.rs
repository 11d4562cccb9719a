//! Encoder types and the sink capability traits

use crate::capture::{Frame, PixelFormat, Resolution};
use crate::recorder::error::RecordingResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Container/codec pairing of the output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoContainer {
    /// MPEG-4 Part 2 tagged as XVID inside AVI
    #[default]
    Avi,
    /// H.264 inside MP4
    Mp4,
}

impl VideoContainer {
    /// Get the file extension for this container
    pub fn extension(&self) -> &'static str {
        match self {
            VideoContainer::Avi => "avi",
            VideoContainer::Mp4 => "mp4",
        }
    }

    /// Get the FFmpeg video codec for this container
    pub fn video_codec(&self) -> &'static str {
        match self {
            VideoContainer::Avi => "mpeg4",
            VideoContainer::Mp4 => "libx264",
        }
    }
}

/// Everything needed to open one output stream
#[derive(Debug, Clone)]
pub struct SinkSpec {
    pub path: PathBuf,
    pub resolution: Resolution,
    pub fps: f64,
    pub container: VideoContainer,
}

/// An open encoder bound to one file.
///
/// `close` must be safe to call more than once; implementations also close
/// on drop so the file is finalized on every exit path.
pub trait FrameSink: Send {
    /// Pixel layout `append_frame` accepts
    fn pixel_format(&self) -> PixelFormat;

    fn append_frame(&mut self, frame: &Frame) -> RecordingResult<()>;

    fn frames_written(&self) -> u64;

    /// Flush and finalize the file
    fn close(&mut self) -> RecordingResult<()>;
}

/// Opens sinks for new sessions
pub trait SinkFactory: Send + Sync {
    fn open_sink(&self, spec: &SinkSpec) -> RecordingResult<Box<dyn FrameSink>>;
}
