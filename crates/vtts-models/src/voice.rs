//! Voice reference metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one stored voice reference.
///
/// Stored as a JSON sidecar next to the reference audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Unique voice name (also the store key).
    pub name: String,
    /// Reference audio filename within the voices directory.
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}
