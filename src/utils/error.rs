//! Error types and handling
//!
//! Common error types used across the application.

use thiserror::Error;

use crate::recorder::RecordingError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    #[error("Settings error: {0}")]
    Settings(String),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
