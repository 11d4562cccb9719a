//! Time formatting for the elapsed readout and output file names

use chrono::{DateTime, Local};
use std::time::Duration;

/// Prefix shared by every recording file name
pub const RECORDING_FILE_PREFIX: &str = "recording_";

/// `strftime` layout of the timestamp embedded in file names
pub const RECORDING_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Format an elapsed duration as `HH:MM:SS`.
///
/// Hours are not wrapped at 24 and grow past two digits when needed.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Build `recording_<YYYYMMDD_HHMMSS>.<ext>` for the given wall-clock time.
///
/// Two sessions started within the same second get the same name.
pub fn recording_file_name(at: DateTime<Local>, extension: &str) -> String {
    format!(
        "{}{}.{}",
        RECORDING_FILE_PREFIX,
        at.format(RECORDING_TIMESTAMP_FORMAT),
        extension
    )
}
