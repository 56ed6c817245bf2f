//! Error types for StrokeForge

use thiserror::Error;

/// Main error type for StrokeForge operations
#[derive(Debug, Error)]
pub enum StrokeForgeError {
    /// Invalid configuration or construction parameter
    #[error("Configuration error: {0}")]
    Config(String),

    /// No model instance is running for the requested label pair
    #[error("No model instance started for label pair '{0}'")]
    ModelNotFound(String),

    /// A model could not be loaded or constructed
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Input data does not match what the operation expects
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A background task panicked or was cancelled by the runtime
    #[error("Background task failed: {0}")]
    Task(String),
}

impl StrokeForgeError {
    /// Returns true if the caller can recover by starting the model instance and retrying.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StrokeForgeError::ModelNotFound(_))
    }
}

/// Result type alias for StrokeForge operations
pub type Result<T> = std::result::Result<T, StrokeForgeError>;
