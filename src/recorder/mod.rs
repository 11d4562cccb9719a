//! Recording system module
//!
//! - `RecordingCoordinator` drives the Idle/Recording state machine
//! - `CaptureLoop` grabs, converts, scales and writes frames on its own thread
//! - `FramePacer` keeps frames on a fixed grid of deadlines

pub mod capture_loop;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pacing;
pub mod resolution;
pub mod state;

#[cfg(test)]
pub(crate) mod fakes;

pub use capture_loop::{CaptureLoop, LoopReport};
pub use config::{RecorderConfig, RecorderSettings, TARGET_FPS};
pub use coordinator::{RecorderBackend, RecordingCoordinator, RecordingEvent};
pub use error::{RecordingError, RecordingResult};
pub use pacing::{Clock, FramePacer, SystemClock};
pub use resolution::{ResolutionCatalog, ResolutionOption};
pub use state::{
    ControlPanel, RecorderCommand, RecordingSession, RecordingState, SessionSummary, SessionToken, StatusIndicator,
    TickOutcome,
};
