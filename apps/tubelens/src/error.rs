//! Error types for the Tubelens application.

use thiserror::Error;
use tubelens_core::CoreError;

/// Result alias for app-level operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced by the CLI and configuration layer.
///
/// Word rotation never produces these: fetch failures are absorbed there.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or command argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Core logic or storage error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Backend request error
    #[error(transparent)]
    Sdk(#[from] tubelens_sdk::Error),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
