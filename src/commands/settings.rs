//! Output directory commands
//!
//! The output directory is the only persisted setting.

use super::recording::RecorderState;
use crate::recorder::config::SETTINGS_FILE_NAME;
use crate::recorder::{ControlPanel, RecorderSettings};
use crate::utils::error::{AppError, AppResult};
use std::path::PathBuf;
use tauri::{AppHandle, Manager, State};
use tauri_plugin_dialog::DialogExt;

/// Location of `settings.json` in the app config directory
pub fn settings_path(app: &AppHandle) -> AppResult<PathBuf> {
    let dir = app
        .path()
        .app_config_dir()
        .map_err(|e| AppError::Settings(format!("No config directory: {}", e)))?;
    Ok(dir.join(SETTINGS_FILE_NAME))
}

async fn apply_output_dir(app: &AppHandle, state: &RecorderState, dir: PathBuf) -> AppResult<ControlPanel> {
    let settings = RecorderSettings { output_dir: dir };
    settings.save(&settings_path(app)?)?;

    let mut coordinator = state.coordinator.lock().await;
    coordinator.set_output_dir(settings.output_dir);
    Ok(coordinator.panel())
}

/// Get the directory recordings are written to
#[tauri::command]
pub async fn get_output_dir(state: State<'_, RecorderState>) -> Result<String, String> {
    Ok(state.coordinator.lock().await.output_dir().to_string_lossy().to_string())
}

/// Set and persist the output directory
#[tauri::command]
pub async fn set_output_dir(
    app: AppHandle,
    state: State<'_, RecorderState>,
    path: String,
) -> Result<ControlPanel, String> {
    apply_output_dir(&app, &state, PathBuf::from(path))
        .await
        .map_err(|e| e.to_string())
}

/// Pick the output directory with the native folder dialog.
///
/// Returns `None` when the dialog is cancelled.
#[tauri::command]
pub async fn choose_output_dir(
    app: AppHandle,
    state: State<'_, RecorderState>,
) -> Result<Option<ControlPanel>, String> {
    let dialog_app = app.clone();
    let picked = tokio::task::spawn_blocking(move || dialog_app.dialog().file().blocking_pick_folder())
        .await
        .map_err(|e| format!("Folder dialog panicked: {}", e))?;

    let Some(folder) = picked else {
        return Ok(None);
    };
    let dir = folder.into_path().map_err(|e| e.to_string())?;

    apply_output_dir(&app, &state, dir)
        .await
        .map(Some)
        .map_err(|e| e.to_string())
}
