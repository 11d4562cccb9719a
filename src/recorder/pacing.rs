//! Fixed-rate frame pacing
//!
//! Deadlines sit on a fixed grid `origin + k / fps`. Each written frame moves
//! the pacer one slot along the grid, whatever time it actually is, so slow
//! iterations never shift later deadlines.

use crate::recorder::error::{RecordingError, RecordingResult};
use std::time::{Duration, Instant};

/// Waits shorter than this are skipped rather than slept
pub const MIN_SLEEP: Duration = Duration::from_millis(1);

/// Source of time for the capture loop
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deadline tracker for one session
#[derive(Debug, Clone)]
pub struct FramePacer {
    origin: Instant,
    fps: f64,
    frame_index: u64,
}

impl FramePacer {
    /// Start a grid at `origin`; the first deadline is `origin` itself
    pub fn new(origin: Instant, fps: f64) -> RecordingResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(RecordingError::ConfigurationError(format!(
                "Frame rate must be positive, got {}",
                fps
            )));
        }
        Ok(Self {
            origin,
            fps,
            frame_index: 0,
        })
    }

    /// Ideal spacing between frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }

    /// Number of grid slots consumed so far
    pub fn frames_scheduled(&self) -> u64 {
        self.frame_index
    }

    /// When the next frame is due
    pub fn next_deadline(&self) -> Instant {
        self.deadline_of(self.frame_index)
    }

    fn deadline_of(&self, index: u64) -> Instant {
        self.origin + Duration::from_secs_f64(index as f64 / self.fps)
    }

    /// How long to sleep before the next frame, if at all.
    ///
    /// `None` when the deadline has passed or is within [`MIN_SLEEP`].
    pub fn wait_time(&self, now: Instant) -> Option<Duration> {
        let remaining = self.next_deadline().saturating_duration_since(now);
        (remaining > MIN_SLEEP).then_some(remaining)
    }

    /// How far `now` is past the next deadline
    pub fn lag(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.next_deadline())
    }

    /// Sleep on `clock` until the next deadline
    pub fn wait(&self, clock: &dyn Clock) {
        if let Some(remaining) = self.wait_time(clock.now()) {
            clock.sleep(remaining);
        }
    }

    /// Move to the next grid slot
    pub fn advance(&mut self) {
        self.frame_index += 1;
    }
}
