//! Recorder configuration
//!
//! Runtime constants plus the small settings file that remembers the output
//! directory between launches.

use crate::encoder::VideoContainer;
use crate::utils::error::AppResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Capture and encoder frame rate
pub const TARGET_FPS: f64 = 15.0;

/// Output directory used when nothing has been saved yet
pub const DEFAULT_OUTPUT_DIR: &str = "recordings";

/// File name of the persisted settings
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderSettings {
    /// Directory recordings are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl RecorderSettings {
    /// Read settings from `path`, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        tracing::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Everything the coordinator needs to open a session
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub output_dir: PathBuf,
    pub target_fps: f64,
    pub container: VideoContainer,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::from(RecorderSettings::default())
    }
}

impl From<RecorderSettings> for RecorderConfig {
    fn from(settings: RecorderSettings) -> Self {
        Self {
            output_dir: settings.output_dir,
            target_fps: TARGET_FPS,
            container: VideoContainer::default(),
        }
    }
}
