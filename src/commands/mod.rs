//! Tauri command handlers
//!
//! IPC commands the control panel calls via Tauri's invoke system.

pub mod recording;
pub mod settings;

use crate::recorder::{RecorderBackend, RecorderConfig, RecorderSettings, RecordingCoordinator};
use recording::RecorderState;
use tauri::{App, Manager};

/// Build the coordinator from saved settings and register it as app state
pub fn setup(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    let handle = app.handle().clone();
    let settings = RecorderSettings::load_or_default(&settings::settings_path(&handle)?)?;
    tracing::info!("Recordings will be written to {:?}", settings.output_dir);

    let coordinator = RecordingCoordinator::new(RecorderConfig::from(settings), RecorderBackend::native())?;
    recording::forward_events(handle, coordinator.subscribe());
    let state = RecorderState::new(coordinator);

    app.manage(state);
    Ok(())
}
