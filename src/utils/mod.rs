//! Shared helpers

pub mod error;
pub mod time;

pub use error::{AppError, AppResult};
pub use time::{format_elapsed, recording_file_name};
