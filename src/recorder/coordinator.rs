//! Recording coordinator
//!
//! Owns the Idle/Recording state machine, opens the output stream for each
//! session and runs the capture loop on its own thread.

use super::capture_loop::{run_session, CaptureLoop};
use super::config::RecorderConfig;
use super::error::{RecordingError, RecordingResult};
use super::pacing::{Clock, SystemClock};
use super::resolution::{ResolutionCatalog, ResolutionOption, DEFAULT_RESOLUTION_LABEL};
use super::state::{ControlPanel, RecorderCommand, RecordingSession, RecordingState, SessionSummary, TickOutcome};
use crate::capture::{CaptureProvider, FrameScaler, ImageScaler};
use crate::encoder::{FfmpegSinkFactory, SinkFactory, SinkSpec};
use crate::utils::recording_file_name;
use chrono::Local;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::broadcast;

/// Events emitted during recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum RecordingEvent {
    /// Recording started, writing to the given file
    Started(String),
    /// Recording stopped
    Stopped(SessionSummary),
    /// The capture loop failed; the session is ending
    Error(String),
}

/// External capabilities the coordinator drives
#[derive(Clone)]
pub struct RecorderBackend {
    pub capture: Arc<dyn CaptureProvider>,
    pub scaler: Arc<dyn FrameScaler>,
    pub sinks: Arc<dyn SinkFactory>,
    pub clock: Arc<dyn Clock>,
}

impl RecorderBackend {
    /// Bilinear scaler, FFmpeg sinks and the system clock around `capture`
    pub fn with_capture(capture: Arc<dyn CaptureProvider>) -> Self {
        Self {
            capture,
            scaler: Arc::new(ImageScaler),
            sinks: Arc::new(FfmpegSinkFactory::default()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Primary monitor through `xcap`
    #[cfg(feature = "native-capture")]
    pub fn native() -> Self {
        Self::with_capture(Arc::new(crate::capture::XcapProvider))
    }
}

/// Manages the recording lifecycle
pub struct RecordingCoordinator {
    /// Current recording state
    state: Arc<RwLock<RecordingState>>,

    backend: RecorderBackend,

    config: RecorderConfig,

    /// Resolution choices, with "Native" fixed at construction
    catalog: ResolutionCatalog,

    selected_resolution: String,

    /// The active session, if any
    session: Option<RecordingSession>,

    /// Capture thread of the active session
    worker: Option<JoinHandle<SessionSummary>>,

    /// Event broadcaster
    event_tx: broadcast::Sender<RecordingEvent>,
}

impl RecordingCoordinator {
    /// Create a coordinator, resolving the native display size now
    pub fn new(config: RecorderConfig, backend: RecorderBackend) -> RecordingResult<Self> {
        let native = backend.capture.display_size()?;
        tracing::info!("Native display resolution: {}", native);

        let (event_tx, _) = broadcast::channel(100);
        Ok(Self {
            state: Arc::new(RwLock::new(RecordingState::Idle)),
            backend,
            config,
            catalog: ResolutionCatalog::new(native),
            selected_resolution: DEFAULT_RESOLUTION_LABEL.to_string(),
            session: None,
            worker: None,
            event_tx,
        })
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// Subscribe to recording events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    pub fn resolutions(&self) -> Vec<ResolutionOption> {
        self.catalog.options()
    }

    pub fn selected_resolution(&self) -> &str {
        &self.selected_resolution
    }

    /// Choose the resolution used by the next session
    pub fn select_resolution(&mut self, label: &str) -> RecordingResult<()> {
        if !self.catalog.contains(label) {
            return Err(RecordingError::InvalidResolution(label.to_string()));
        }
        tracing::debug!("Selected resolution {}", label);
        self.selected_resolution = label.to_string();
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Change where the next session is written
    pub fn set_output_dir(&mut self, dir: PathBuf) {
        tracing::info!("Output directory set to {:?}", dir);
        self.config.output_dir = dir;
    }

    /// Current view model for the control panel
    pub fn panel(&self) -> ControlPanel {
        let elapsed = self
            .session
            .as_ref()
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO);
        ControlPanel::new(
            self.state(),
            elapsed,
            &self.selected_resolution,
            &self.config.output_dir.to_string_lossy(),
        )
    }

    /// Apply one command and return the resulting panel
    pub fn handle(&mut self, command: RecorderCommand) -> RecordingResult<ControlPanel> {
        match command {
            RecorderCommand::Start => {
                self.start()?;
            }
            RecorderCommand::Stop => {
                self.stop()?;
            }
            RecorderCommand::Tick => {
                self.tick();
            }
        }
        Ok(self.panel())
    }

    /// Start recording
    pub fn start(&mut self) -> RecordingResult<PathBuf> {
        self.reap_finished();
        if self.session.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let resolution = self.catalog.resolve(&self.selected_resolution)?;
        let fps = self.config.target_fps;
        let container = self.config.container;

        std::fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            tracing::error!("Failed to create output directory {:?}: {}", self.config.output_dir, e);
            e
        })?;

        let output_path = self
            .config
            .output_dir
            .join(recording_file_name(Local::now(), container.extension()));

        let capturer = self.backend.capture.open_capturer()?;

        let spec = SinkSpec {
            path: output_path.clone(),
            resolution,
            fps,
            container,
        };
        let sink = self.backend.sinks.open_sink(&spec).map_err(|e| {
            tracing::error!("Could not open video writer: {}", e);
            e
        })?;

        let session = RecordingSession::new(output_path.clone(), resolution, fps);
        let capture_loop = CaptureLoop::new(
            capturer,
            self.backend.scaler.clone(),
            self.backend.clock.clone(),
            resolution,
            fps,
            session.token.clone(),
        );

        let worker_session = session.clone();
        let events = self.event_tx.clone();
        let handle = std::thread::Builder::new()
            .name("capture-loop".to_string())
            .spawn(move || run_session(capture_loop, sink, worker_session, events))?;

        tracing::info!(
            "Recording {} started {} at {}. Output file: {:?}",
            session.id,
            session.started_at.format("%H:%M:%S"),
            resolution,
            output_path
        );

        self.session = Some(session);
        self.worker = Some(handle);
        *self.state.write() = RecordingState::Recording;
        let _ = self
            .event_tx
            .send(RecordingEvent::Started(output_path.to_string_lossy().to_string()));

        Ok(output_path)
    }

    /// Stop recording.
    ///
    /// Blocks until the capture thread has finished its current frame and
    /// closed the output file.
    pub fn stop(&mut self) -> RecordingResult<SessionSummary> {
        let session = self.session.take().ok_or(RecordingError::NotRecording)?;

        tracing::info!("Stopping recording {}", session.id);
        session.token.cancel();

        Ok(self.finish(session))
    }

    /// Refresh the elapsed readout, picking up sessions that ended on error
    pub fn tick(&mut self) -> TickOutcome {
        let finished = self.reap_finished();
        let panel = self.panel();
        TickOutcome {
            continue_ticking: panel.state == RecordingState::Recording,
            panel,
            finished,
        }
    }

    /// Stop any active session; used on application exit
    pub fn shutdown(&mut self) -> Option<SessionSummary> {
        if self.session.is_none() {
            return None;
        }
        match self.stop() {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Failed to stop recording on shutdown: {}", e);
                None
            }
        }
    }

    /// Move to Idle if the capture thread exited on its own
    fn reap_finished(&mut self) -> Option<SessionSummary> {
        let ended = match (&self.session, &self.worker) {
            (Some(session), Some(worker)) => !session.is_active() || worker.is_finished(),
            (Some(_), None) => true,
            _ => false,
        };
        if !ended {
            return None;
        }

        let session = self.session.take()?;
        tracing::warn!("Recording {} ended without a stop request", session.id);
        Some(self.finish(session))
    }

    /// Join the capture thread and return to Idle
    fn finish(&mut self, session: RecordingSession) -> SessionSummary {
        let summary = match self.worker.take().map(JoinHandle::join) {
            Some(Ok(summary)) => summary,
            Some(Err(_)) => {
                tracing::error!("Capture thread for {} panicked", session.id);
                Self::failed_summary(&session, "Capture thread panicked")
            }
            None => Self::failed_summary(&session, "Capture thread missing"),
        };

        *self.state.write() = RecordingState::Idle;
        let _ = self.event_tx.send(RecordingEvent::Stopped(summary.clone()));

        tracing::info!(
            "Recording stopped. {} frames in {:.0}ms",
            summary.frames_written,
            summary.duration_ms
        );
        summary
    }

    fn failed_summary(session: &RecordingSession, message: &str) -> SessionSummary {
        SessionSummary {
            id: session.id.to_string(),
            output_path: session.output_path.to_string_lossy().to_string(),
            resolution: session.resolution,
            frames_written: 0,
            duration_ms: session.elapsed().as_secs_f64() * 1000.0,
            error: Some(message.to_string()),
        }
    }
}

impl Drop for RecordingCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
