//! # Application Errors

use autograde_core::AutogradeError;
use thiserror::Error;

/// Errors raised by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// The core rejected an operation or configuration.
    #[error(transparent)]
    Core(#[from] AutogradeError),

    /// The configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// A scenario file is malformed or refers to unknown data.
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// A request refers to something the sandbox does not know.
    #[error("Unknown {kind}: {name}")]
    Unknown { kind: &'static str, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP server failed to bind or serve.
    #[error("Server error: {0}")]
    Server(String),
}
