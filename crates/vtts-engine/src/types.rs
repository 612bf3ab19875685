//! Engine service request/response types.

use serde::{Deserialize, Serialize};

/// Request for speech synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
    /// Path to the voice reference audio
    pub voice_path: String,
    /// Playback speed multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Fixed sampling seed for reproducible output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Request for voice conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Path to the source speech audio
    pub source_path: String,
    /// Path to the target voice reference audio
    pub voice_path: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
