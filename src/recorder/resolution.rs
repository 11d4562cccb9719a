//! Output resolution choices offered in the control panel

use crate::capture::Resolution;
use crate::recorder::error::{RecordingError, RecordingResult};
use serde::{Deserialize, Serialize};

/// Label of the entry that follows the real display size
pub const NATIVE_LABEL: &str = "Native";

/// Label selected when the panel opens
pub const DEFAULT_RESOLUTION_LABEL: &str = "1080p";

/// One selectable entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOption {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Fixed label → size table, in display order.
///
/// "Native" is resolved once, when the catalog is built.
#[derive(Debug, Clone)]
pub struct ResolutionCatalog {
    entries: Vec<(&'static str, Resolution)>,
}

impl ResolutionCatalog {
    pub fn new(native: Resolution) -> Self {
        Self {
            entries: vec![
                (NATIVE_LABEL, native),
                ("1080p", Resolution::new(1920, 1080)),
                ("720p", Resolution::new(1280, 720)),
                ("480p", Resolution::new(640, 480)),
            ],
        }
    }

    /// Look up a label
    pub fn resolve(&self, label: &str) -> RecordingResult<Resolution> {
        self.entries
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, resolution)| *resolution)
            .ok_or_else(|| RecordingError::InvalidResolution(label.to_string()))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(name, _)| *name == label)
    }

    pub fn options(&self) -> Vec<ResolutionOption> {
        self.entries
            .iter()
            .map(|(label, resolution)| ResolutionOption {
                label: label.to_string(),
                width: resolution.width,
                height: resolution.height,
            })
            .collect()
    }
}
