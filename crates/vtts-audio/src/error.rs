//! Error types for audio operations.

use std::path::PathBuf;
use thiserror::Error;

use vtts_models::ExportFormat;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur in the concatenation pipeline.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Invalid silence notation: {0:?} (expected \"(<number>s)\" or \"(<number>ms)\")")]
    InvalidSilenceNotation(String),

    #[error("Silence duration {requested_ms} ms exceeds the {max_ms} ms maximum")]
    SilenceTooLong { requested_ms: u64, max_ms: u64 },

    #[error("Upload index {index} out of range ({upload_count} uploaded files supplied)")]
    InvalidUploadIndex { index: usize, upload_count: usize },

    #[error("Segment list contains no audio segments")]
    NoAudioSegments,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to decode {name}: {message}")]
    Decode { name: String, message: String },

    #[error("Failed to encode {format} output: {message}")]
    Encoding {
        format: ExportFormat,
        message: String,
    },

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFmpeg timed out after {0} seconds")]
    Timeout(u64),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AudioError {
    /// Create a decode failure for a named segment.
    pub fn decode(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an encoding failure naming the offending format.
    pub fn encoding(format: ExportFormat, message: impl Into<String>) -> Self {
        Self::Encoding {
            format,
            message: message.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error was caused by the request rather than the server.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AudioError::InvalidSilenceNotation(_)
                | AudioError::SilenceTooLong { .. }
                | AudioError::InvalidUploadIndex { .. }
                | AudioError::NoAudioSegments
        )
    }
}
