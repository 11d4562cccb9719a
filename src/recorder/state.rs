//! Recording state management
//!
//! Defines the recording state machine, the session record and the view
//! model the control panel renders.

use crate::capture::Resolution;
use crate::utils::format_elapsed;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Current state of the recording system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    #[default]
    Idle,
    /// Currently recording
    Recording,
}

/// Discrete inputs that drive the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderCommand {
    Start,
    Stop,
    /// Periodic elapsed-time refresh
    Tick,
}

/// Two-state status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusIndicator {
    Ready,
    RecordingInProgress,
}

impl StatusIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusIndicator::Ready => "ready",
            StatusIndicator::RecordingInProgress => "recording in progress",
        }
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RecordingState> for StatusIndicator {
    fn from(state: RecordingState) -> Self {
        match state {
            RecordingState::Idle => StatusIndicator::Ready,
            RecordingState::Recording => StatusIndicator::RecordingInProgress,
        }
    }
}

/// Cooperative stop flag shared with the capture thread.
///
/// It only ever goes from active to cancelled within a session.
#[derive(Debug, Clone, Default)]
pub struct SessionToken {
    active: Arc<AtomicBool>,
}

impl SessionToken {
    /// A token in the active state
    pub fn new_active() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Ask the capture loop to exit after its current iteration
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// The session currently being recorded
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: Uuid,
    pub output_path: PathBuf,
    pub resolution: Resolution,
    pub target_fps: f64,
    /// Wall-clock start, for display and logs
    pub started_at: DateTime<Local>,
    /// Monotonic start, for the elapsed readout
    pub started: Instant,
    pub token: SessionToken,
}

impl RecordingSession {
    pub fn new(output_path: PathBuf, resolution: Resolution, target_fps: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            output_path,
            resolution,
            target_fps,
            started_at: Local::now(),
            started: Instant::now(),
            token: SessionToken::new_active(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.token.is_active()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Result of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub output_path: String,
    pub resolution: Resolution,
    pub frames_written: u64,
    pub duration_ms: f64,
    /// Set when the session ended because of a failure
    pub error: Option<String>,
}

/// What the control panel shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPanel {
    pub state: RecordingState,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    /// `HH:MM:SS`
    pub elapsed: String,
    pub status: StatusIndicator,
    pub status_text: String,
    pub selected_resolution: String,
    pub output_dir: String,
}

impl ControlPanel {
    pub fn new(state: RecordingState, elapsed: Duration, selected_resolution: &str, output_dir: &str) -> Self {
        let recording = state == RecordingState::Recording;
        let status = StatusIndicator::from(state);
        Self {
            state,
            start_enabled: !recording,
            stop_enabled: recording,
            elapsed: format_elapsed(if recording { elapsed } else { Duration::ZERO }),
            status,
            status_text: status.to_string(),
            selected_resolution: selected_resolution.to_string(),
            output_dir: output_dir.to_string(),
        }
    }
}

/// Answer to a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickOutcome {
    pub panel: ControlPanel,
    /// False once recording has ended; the UI stops scheduling ticks
    pub continue_ticking: bool,
    /// Present when the tick observed a session that ended on its own
    pub finished: Option<SessionSummary>,
}
