//! Concatenation request types and validated parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::format::ExportFormat;
use crate::segment::SegmentSpec;

/// How the result of a request is presented to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Stream the primary format's encoded bytes directly.
    #[default]
    Stream,
    /// Store every encoded format and return a JSON summary with URLs.
    Url,
}

/// Shared concatenation/export parameters.
///
/// Range bounds follow the public API contract; `validate()` must be called
/// before the parameters reach the audio pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConcatParams {
    /// Requested output formats; the first one is the streaming primary.
    #[serde(default = "default_export_formats")]
    #[validate(length(min = 1, message = "at least one export format is required"))]
    pub export_formats: Vec<ExportFormat>,

    /// Scale each segment toward a common loudness before composition.
    #[serde(default = "default_true")]
    pub normalize_levels: bool,

    /// Crossfade window at direct (zero-gap) boundaries, in milliseconds.
    #[serde(default)]
    #[validate(range(min = 0, max = 5000))]
    pub crossfade_ms: u32,

    /// Base natural pause between segments without explicit silence; 0 disables.
    #[serde(default)]
    #[validate(range(min = 0, max = 3000))]
    pub pause_duration_ms: u32,

    /// Uniform random variation applied to natural pauses.
    #[serde(default = "default_pause_variation_ms")]
    #[validate(range(min = 0, max = 500))]
    pub pause_variation_ms: u32,

    /// Remove leading/trailing near-silence from each segment.
    #[serde(default)]
    pub trim: bool,

    /// Minimum silence run eligible for trimming, in milliseconds.
    #[serde(default = "default_trim_threshold_ms")]
    #[validate(range(min = 50, max = 1000))]
    pub trim_threshold_ms: u32,

    /// Optional custom filename stem for stored outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,

    /// Streaming vs. URL response presentation.
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// Fixed seed for natural pause sampling (reproducible output).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ConcatParams {
    fn default() -> Self {
        Self {
            export_formats: default_export_formats(),
            normalize_levels: true,
            crossfade_ms: 0,
            pause_duration_ms: 0,
            pause_variation_ms: default_pause_variation_ms(),
            trim: false,
            trim_threshold_ms: default_trim_threshold_ms(),
            output_filename: None,
            response_mode: ResponseMode::default(),
            seed: None,
        }
    }
}

fn default_export_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Wav]
}

fn default_true() -> bool {
    true
}

fn default_pause_variation_ms() -> u32 {
    200
}

fn default_trim_threshold_ms() -> u32 {
    200
}

/// Server-file concatenation request (JSON body).
///
/// `files` entries are either filenames relative to the outputs directory or
/// silence notations like `"(1.5s)"` / `"(500ms)"`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConcatRequest {
    #[validate(length(min = 1, message = "at least one segment is required"))]
    pub files: Vec<String>,

    #[serde(flatten)]
    #[validate(nested)]
    pub params: ConcatParams,
}

/// Mixed-source concatenation request (multipart `request` part).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MixedConcatRequest {
    #[validate(length(min = 1, message = "at least one segment is required"))]
    pub segments: Vec<SegmentSpec>,

    #[serde(flatten)]
    #[validate(nested)]
    pub params: ConcatParams,
}

/// Single-file trim request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrimRequest {
    /// File in the outputs directory to trim.
    pub source: String,

    #[serde(default = "default_trim_threshold_ms")]
    #[validate(range(min = 50, max = 1000))]
    pub trim_threshold_ms: u32,

    #[serde(default = "default_export_formats")]
    #[validate(length(min = 1))]
    pub export_formats: Vec<ExportFormat>,

    #[serde(default)]
    pub response_mode: ResponseMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
}

/// Text-to-speech request, proxied to the model server and then exported.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TtsRequest {
    #[validate(length(min = 1, max = 20000))]
    pub text: String,

    /// Voice reference name from the voices store.
    pub voice: String,

    /// Playback speed multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.25, max = 4.0))]
    pub speed: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default = "default_export_formats")]
    #[validate(length(min = 1))]
    pub export_formats: Vec<ExportFormat>,

    #[serde(default)]
    pub response_mode: ResponseMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
}

/// Voice conversion parameters, carried as the `request` part of a
/// multipart upload whose file part is the source audio.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VoiceConvertParams {
    /// Target voice name from the voices store.
    pub voice: String,

    #[serde(default = "default_export_formats")]
    #[validate(length(min = 1))]
    pub export_formats: Vec<ExportFormat>,

    #[serde(default)]
    pub response_mode: ResponseMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
}
