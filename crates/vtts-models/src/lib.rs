//! Shared data models for the VTTS backend.
//!
//! This crate provides Serde-serializable types for:
//! - Concatenation requests and their validated parameters
//! - Segment descriptors (server files, uploads, silences)
//! - Export formats
//! - Processing reports and composition output summaries
//! - Voice reference metadata

pub mod concat;
pub mod format;
pub mod report;
pub mod segment;
pub mod voice;

// Re-export common types
pub use concat::{
    ConcatParams, ConcatRequest, MixedConcatRequest, ResponseMode, TrimRequest, TtsRequest,
    VoiceConvertParams,
};
pub use format::{ExportFormat, FormatParseError};
pub use report::{CompositionOutput, OutputFile, ProcessingReport, ReportEntry, TrimResult};
pub use segment::SegmentSpec;
pub use voice::VoiceInfo;
