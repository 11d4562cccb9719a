//! In-memory capture, sink and clock doubles for unit tests

use super::error::{RecordingError, RecordingResult};
use super::pacing::Clock;
use super::state::SessionToken;
use crate::capture::{CaptureProvider, Frame, PixelFormat, Resolution, ScreenCapturer};
use crate::encoder::{FrameSink, SinkFactory, SinkSpec};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Manually advanced clock; `sleep` returns immediately after moving time
pub struct FakeClock {
    base: Instant,
    now: Mutex<Instant>,
    sleeps: Mutex<Vec<Duration>>,
    cancel: Mutex<Option<(Instant, SessionToken)>>,
}

impl FakeClock {
    pub fn new() -> Self {
        let base = Instant::now();
        Self {
            base,
            now: Mutex::new(base),
            sleeps: Mutex::new(Vec::new()),
            cancel: Mutex::new(None),
        }
    }

    /// Cancel `token` once simulated time reaches `after`
    pub fn cancel_at(&self, after: Duration, token: SessionToken) {
        *self.cancel.lock() = Some((self.base + after, token));
    }

    pub fn advance(&self, by: Duration) {
        let now = {
            let mut now = self.now.lock();
            *now += by;
            *now
        };
        if let Some((at, token)) = self.cancel.lock().as_ref() {
            if now >= *at {
                token.cancel();
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.now.lock() - self.base
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
    }
}

/// Produces solid frames, optionally costing simulated time or failing
pub struct FakeCapturer {
    size: Resolution,
    format: PixelFormat,
    cost: Option<(Arc<FakeClock>, Duration)>,
    fail_on: Option<u64>,
    cancel_after: Option<(u64, SessionToken)>,
    captured: u64,
}

impl FakeCapturer {
    pub fn new(size: Resolution) -> Self {
        Self {
            size,
            format: PixelFormat::Rgba,
            cost: None,
            fail_on: None,
            cancel_after: None,
            captured: 0,
        }
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_cost(mut self, clock: Arc<FakeClock>, cost: Duration) -> Self {
        self.cost = Some((clock, cost));
        self
    }

    /// Fail the `n`th capture (1-based)
    pub fn fail_on(mut self, n: u64) -> Self {
        self.fail_on = Some(n);
        self
    }

    /// Cancel `token` after `n` successful captures
    pub fn cancel_after(mut self, n: u64, token: SessionToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }
}

impl ScreenCapturer for FakeCapturer {
    fn capture_frame(&mut self) -> RecordingResult<Frame> {
        self.captured += 1;
        if self.fail_on == Some(self.captured) {
            return Err(RecordingError::CaptureError("injected capture failure".to_string()));
        }
        if let Some((clock, cost)) = &self.cost {
            clock.advance(*cost);
        }
        if let Some((n, token)) = &self.cancel_after {
            if self.captured >= *n {
                token.cancel();
            }
        }
        Frame::new(
            self.size.width,
            self.size.height,
            self.format,
            [40, 80, 120, 255].repeat(self.size.pixel_count()),
        )
    }
}

/// Provider handing out [`FakeCapturer`]s
pub struct FakeProvider {
    pub size: Resolution,
    pub fail_on: Option<u64>,
}

impl FakeProvider {
    pub fn new(size: Resolution) -> Self {
        Self { size, fail_on: None }
    }
}

impl CaptureProvider for FakeProvider {
    fn display_size(&self) -> RecordingResult<Resolution> {
        Ok(self.size)
    }

    fn open_capturer(&self) -> RecordingResult<Box<dyn ScreenCapturer>> {
        let mut capturer = FakeCapturer::new(self.size);
        capturer.fail_on = self.fail_on;
        Ok(Box::new(capturer))
    }
}

/// Observer for a [`MemorySink`] after it has moved to another thread
#[derive(Clone, Default)]
pub struct SinkObserver {
    frames: Arc<Mutex<Vec<(Resolution, PixelFormat)>>>,
    closed: Arc<AtomicBool>,
    close_calls: Arc<AtomicU64>,
}

impl SinkObserver {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> u64 {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames.lock().len() as u64
    }
}

/// Records frame metadata instead of encoding
pub struct MemorySink {
    format: PixelFormat,
    observer: SinkObserver,
}

impl MemorySink {
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            observer: SinkObserver::default(),
        }
    }

    pub fn observer(&self) -> SinkObserver {
        self.observer.clone()
    }

    pub fn frames(&self) -> Vec<(Resolution, PixelFormat)> {
        self.observer.frames.lock().clone()
    }
}

impl FrameSink for MemorySink {
    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn append_frame(&mut self, frame: &Frame) -> RecordingResult<()> {
        if self.observer.is_closed() {
            return Err(RecordingError::EncodingError("sink closed".to_string()));
        }
        self.observer.frames.lock().push((frame.resolution(), frame.format));
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.observer.frames_written()
    }

    fn close(&mut self) -> RecordingResult<()> {
        self.observer.close_calls.fetch_add(1, Ordering::SeqCst);
        self.observer.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        self.observer.closed.store(true, Ordering::SeqCst);
    }
}

/// Opens a fresh [`MemorySink`] per session and keeps an observer for each
#[derive(Default)]
pub struct MemorySinkFactory {
    pub fail_open: bool,
    pub opened: Mutex<Vec<SinkSpec>>,
    observers: Mutex<Vec<SinkObserver>>,
}

impl MemorySinkFactory {
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Observer of the most recently opened sink
    pub fn last_observer(&self) -> Option<SinkObserver> {
        self.observers.lock().last().cloned()
    }

    pub fn open_count(&self) -> usize {
        self.observers.lock().len()
    }
}

impl SinkFactory for MemorySinkFactory {
    fn open_sink(&self, spec: &SinkSpec) -> RecordingResult<Box<dyn FrameSink>> {
        if self.fail_open {
            return Err(RecordingError::EncodingError("Could not open video writer".to_string()));
        }
        let sink = MemorySink::new(PixelFormat::Rgba);
        self.observers.lock().push(sink.observer());
        self.opened.lock().push(spec.clone());
        Ok(Box::new(sink))
    }
}
