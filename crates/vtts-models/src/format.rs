//! Export format definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported audio export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Uncompressed PCM WAV
    Wav,
    /// MPEG Layer-3
    Mp3,
    /// Free Lossless Audio Codec
    Flac,
}

impl ExportFormat {
    /// All supported formats.
    pub const ALL: &'static [ExportFormat] =
        &[ExportFormat::Wav, ExportFormat::Mp3, ExportFormat::Flac];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
            ExportFormat::Flac => "flac",
        }
    }

    /// MIME type for HTTP responses.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "audio/wav",
            ExportFormat::Mp3 => "audio/mpeg",
            ExportFormat::Flac => "audio/flac",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(ExportFormat::Wav),
            "mp3" => Ok(ExportFormat::Mp3),
            "flac" => Ok(ExportFormat::Flac),
            _ => Err(FormatParseError(s.to_string())),
        }
    }
}

/// Error for unrecognized format names.
#[derive(Debug, Error)]
#[error("Unsupported export format: {0}")]
pub struct FormatParseError(pub String);
