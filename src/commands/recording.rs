//! Recording-related Tauri commands

use crate::recorder::{
    ControlPanel, RecordingCoordinator, RecordingEvent, ResolutionOption, SessionSummary, TickOutcome,
};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;

/// Application state for recording
pub struct RecorderState {
    pub coordinator: Arc<Mutex<RecordingCoordinator>>,
}

impl RecorderState {
    pub fn new(coordinator: RecordingCoordinator) -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
        }
    }
}

/// Forward coordinator events to the webview
pub fn forward_events(app: AppHandle, mut rx: broadcast::Receiver<RecordingEvent>) {
    tauri::async_runtime::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = match &event {
                        RecordingEvent::Started(_) => "recording-started",
                        RecordingEvent::Stopped(_) => "recording-stopped",
                        RecordingEvent::Error(_) => "recording-error",
                    };
                    if let Err(e) = app.emit(name, &event) {
                        tracing::warn!("Failed to emit {}: {}", name, e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} recording events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Get the selectable output resolutions
#[tauri::command]
pub async fn get_resolutions(state: State<'_, RecorderState>) -> Result<Vec<ResolutionOption>, String> {
    Ok(state.coordinator.lock().await.resolutions())
}

/// Choose the resolution for the next recording
#[tauri::command]
pub async fn select_resolution(state: State<'_, RecorderState>, label: String) -> Result<ControlPanel, String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.select_resolution(&label).map_err(|e| e.to_string())?;
    Ok(coordinator.panel())
}

/// Get the control panel state
#[tauri::command]
pub async fn get_panel(state: State<'_, RecorderState>) -> Result<ControlPanel, String> {
    Ok(state.coordinator.lock().await.panel())
}

/// Start recording
#[tauri::command]
pub async fn start_recording(state: State<'_, RecorderState>) -> Result<ControlPanel, String> {
    let coordinator = state.coordinator.clone();

    // Opening the encoder spawns a process; keep it off the async workers
    tokio::task::spawn_blocking(move || -> Result<ControlPanel, String> {
        let mut coordinator = coordinator.blocking_lock();
        coordinator.start().map_err(|e| e.to_string())?;
        Ok(coordinator.panel())
    })
    .await
    .map_err(|e| format!("Start task panicked: {}", e))?
}

/// Stop recording and wait for the file to be finalized
#[tauri::command]
pub async fn stop_recording(state: State<'_, RecorderState>) -> Result<SessionSummary, String> {
    let coordinator = state.coordinator.clone();

    tokio::task::spawn_blocking(move || coordinator.blocking_lock().stop().map_err(|e| e.to_string()))
        .await
        .map_err(|e| format!("Stop task panicked: {}", e))?
}

/// Refresh the elapsed-time readout; called once per second by the panel
#[tauri::command]
pub async fn tick(state: State<'_, RecorderState>) -> Result<TickOutcome, String> {
    let coordinator = state.coordinator.clone();

    tokio::task::spawn_blocking(move || coordinator.blocking_lock().tick())
        .await
        .map_err(|e| format!("Tick task panicked: {}", e))
}
