//! Video encoding
//!
//! Sinks turn raw frames into a playable file. The production sink pipes
//! frames into an `ffmpeg` child process.

pub mod ffmpeg;
pub mod types;

pub use ffmpeg::{FfmpegSink, FfmpegSinkFactory};
pub use types::{FrameSink, SinkFactory, SinkSpec, VideoContainer};
