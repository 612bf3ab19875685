#![deny(unreachable_patterns)]
//! Audio concatenation and trimming engine.
//!
//! This crate provides:
//! - Segment list parsing (server files, upload references, silence notation)
//! - Mixed-mode gap resolution (explicit silence, natural pauses, direct joins)
//! - Windowed-RMS edge trimming with audit records
//! - Median-RMS level normalization with a peak guard
//! - Timeline composition with crossfades at direct boundaries
//! - Multi-format export (in-process WAV, FFmpeg-backed MP3/FLAC)

pub mod buffer;
pub mod command;
pub mod compose;
pub mod decode;
pub mod error;
pub mod export;
pub mod gaps;
pub mod level;
pub mod parse;
pub mod pipeline;
pub mod resample;
pub mod temp;
pub mod trim;

pub use buffer::AudioBuffer;
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use compose::{compose, Composition, LoadedSegment};
pub use decode::decode_file;
pub use error::{AudioError, AudioResult};
pub use export::{encode_all, generate_stem, timestamp_stem, EncodedOutput, FilenameMeta};
pub use gaps::{resolve_timeline, GapPolicy, ResolvedGap, Timeline};
pub use level::normalize_levels;
pub use parse::{parse_file_list, parse_segment_specs, AudioSource, ParsedSegment, MAX_SILENCE_MS};
pub use pipeline::{run_concat, run_trim, PipelineOutput, SourceResolver, TrimOutput};
pub use temp::UploadScope;
pub use trim::{trim_edges, TrimOutcome};
