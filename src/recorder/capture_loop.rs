//! Capture loop
//!
//! Runs on the capture thread for the lifetime of one session: grab a frame,
//! bring it to the sink's pixel layout and size, append it, then wait for the
//! next slot on the pacing grid.

use super::coordinator::RecordingEvent;
use super::error::RecordingResult;
use super::pacing::{Clock, FramePacer};
use super::state::{RecordingSession, SessionSummary, SessionToken};
use crate::capture::{FrameScaler, Resolution, ScreenCapturer};
use crate::encoder::FrameSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Pacing statistics for a finished loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopReport {
    pub frames_written: u64,
    /// Frames that started more than one interval after their deadline
    pub late_frames: u64,
    pub max_lag: Duration,
}

pub struct CaptureLoop {
    capturer: Box<dyn ScreenCapturer>,
    scaler: Arc<dyn FrameScaler>,
    clock: Arc<dyn Clock>,
    resolution: Resolution,
    fps: f64,
    token: SessionToken,
}

impl CaptureLoop {
    pub fn new(
        capturer: Box<dyn ScreenCapturer>,
        scaler: Arc<dyn FrameScaler>,
        clock: Arc<dyn Clock>,
        resolution: Resolution,
        fps: f64,
        token: SessionToken,
    ) -> Self {
        Self {
            capturer,
            scaler,
            clock,
            resolution,
            fps,
            token,
        }
    }

    /// Capture until the token is cancelled or a step fails.
    ///
    /// Every iteration writes a frame, even when it starts late. The first
    /// frame is written even if the token is already cancelled, so a stopped
    /// session always yields a playable file. The sink is not closed here.
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> RecordingResult<LoopReport> {
        let mut pacer = FramePacer::new(self.clock.now(), self.fps)?;
        let interval = pacer.frame_interval();
        let target_format = sink.pixel_format();
        let mut report = LoopReport::default();

        loop {
            if report.frames_written > 0 {
                if !self.token.is_active() {
                    break;
                }
                pacer.wait(self.clock.as_ref());
                // Stop may have been requested while sleeping
                if !self.token.is_active() {
                    break;
                }
            }

            let lag = pacer.lag(self.clock.now());
            if lag > interval {
                report.late_frames += 1;
            }
            report.max_lag = report.max_lag.max(lag);

            let frame = self.capturer.capture_frame()?.into_format(target_format);
            let frame = if frame.resolution() != self.resolution {
                self.scaler.resize(frame, self.resolution)?
            } else {
                frame
            };

            sink.append_frame(&frame)?;
            report.frames_written += 1;
            pacer.advance();
        }

        Ok(report)
    }
}

/// Body of the capture thread.
///
/// Runs the loop, then closes the sink whatever the outcome. A failure
/// cancels the session token and is broadcast as
/// [`RecordingEvent::Error`].
pub fn run_session(
    mut capture_loop: CaptureLoop,
    mut sink: Box<dyn FrameSink>,
    session: RecordingSession,
    events: broadcast::Sender<RecordingEvent>,
) -> SessionSummary {
    tracing::debug!(
        "Capture loop {} running at {} @ {}fps",
        session.id,
        session.resolution,
        session.target_fps
    );

    let result = capture_loop.run(sink.as_mut());
    session.token.cancel();

    let mut error = match result {
        Ok(report) => {
            tracing::info!(
                "Capture loop finished: {} frames, {} late, max lag {:?}",
                report.frames_written,
                report.late_frames,
                report.max_lag
            );
            None
        }
        Err(e) => {
            tracing::error!("Error during recording: {}", e);
            Some(e.to_string())
        }
    };

    if let Err(e) = sink.close() {
        tracing::error!("Failed to finalize {:?}: {}", session.output_path, e);
        error.get_or_insert_with(|| e.to_string());
    }

    if let Some(ref message) = error {
        let _ = events.send(RecordingEvent::Error(message.clone()));
    }

    SessionSummary {
        id: session.id.to_string(),
        output_path: session.output_path.to_string_lossy().to_string(),
        resolution: session.resolution,
        frames_written: sink.frames_written(),
        duration_ms: session.elapsed().as_secs_f64() * 1000.0,
        error,
    }
}
