//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage: {0}")]
    ConfigError(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Voice already exists: {0}")]
    VoiceExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Whether this error maps to a caller mistake rather than a server fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound(_)
                | StorageError::InvalidName(_)
                | StorageError::VoiceNotFound(_)
                | StorageError::VoiceExists(_)
        )
    }
}
