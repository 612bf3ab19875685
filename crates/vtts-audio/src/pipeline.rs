//! End-to-end concatenation pipeline.
//!
//! Orchestrates parse -> decode -> trim -> normalize -> compose -> export.
//! Decode and DSP run on the blocking pool; encoding is async because the
//! compressed formats shell out to FFmpeg.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument};

use vtts_models::{ConcatParams, ExportFormat, ProcessingReport, ReportEntry, TrimResult};

use crate::buffer::AudioBuffer;
use crate::compose::{compose, LoadedSegment};
use crate::decode::decode_file;
use crate::error::{AudioError, AudioResult};
use crate::export::{encode_all, generate_stem, EncodedOutput, FilenameMeta};
use crate::gaps::resolve_timeline;
use crate::level::normalize_levels;
use crate::parse::{AudioSource, ParsedSegment};
use crate::trim::trim_edges;

/// Maps server-file references onto the filesystem.
///
/// Keeps the pipeline independent of where outputs actually live; the
/// storage layer supplies the real implementation.
pub trait SourceResolver: Send + Sync {
    /// Resolve a server-file reference to a readable path.
    fn resolve(&self, name: &str) -> AudioResult<PathBuf>;
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub report: ProcessingReport,
    pub encoded: Vec<EncodedOutput>,
    pub total_duration_ms: f64,
    pub sample_rate: u32,
    pub segment_count: usize,
}

impl PipelineOutput {
    /// The first requested format's encoded stream (the streaming primary).
    pub fn primary(&self) -> &EncodedOutput {
        &self.encoded[0]
    }
}

/// Run the full concatenation pipeline over an already-parsed segment list.
#[instrument(skip_all, fields(segments = segments.len()))]
pub async fn run_concat(
    segments: Vec<ParsedSegment>,
    params: &ConcatParams,
    resolver: &dyn SourceResolver,
    uploads: &[PathBuf],
) -> AudioResult<PipelineOutput> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let timeline = resolve_timeline(
        &segments,
        params.pause_duration_ms,
        params.pause_variation_ms,
        &mut rng,
    )?;

    // Resolve every source to a path up front so missing files fail before
    // any decoding work starts.
    let mut inputs: Vec<(String, PathBuf)> = Vec::with_capacity(timeline.sources.len());
    for source in &timeline.sources {
        let path = match source {
            AudioSource::ServerFile(name) => resolver.resolve(name)?,
            AudioSource::Uploaded(index) => uploads
                .get(*index)
                .cloned()
                .ok_or(AudioError::InvalidUploadIndex {
                    index: *index,
                    upload_count: uploads.len(),
                })?,
        };
        inputs.push((source.display_name(), path));
    }

    let trim = params.trim;
    let trim_threshold_ms = params.trim_threshold_ms;
    let normalize = params.normalize_levels;
    let crossfade_ms = params.crossfade_ms;
    let timeline_for_compose = timeline.clone();

    let composition = tokio::task::spawn_blocking(move || {
        let mut names: Vec<String> = Vec::with_capacity(inputs.len());
        let mut buffers: Vec<AudioBuffer> = Vec::with_capacity(inputs.len());
        let mut trims: Vec<Option<TrimResult>> = Vec::with_capacity(inputs.len());

        for (name, path) in inputs {
            let decoded = decode_file(&path, &name)?;
            if trim {
                let outcome = trim_edges(&decoded, trim_threshold_ms);
                buffers.push(outcome.buffer);
                trims.push(Some(outcome.result));
            } else {
                buffers.push(decoded);
                trims.push(None);
            }
            names.push(name);
        }

        if normalize {
            normalize_levels(&mut buffers);
        }

        let loaded: Vec<LoadedSegment> = names
            .into_iter()
            .zip(buffers)
            .zip(trims)
            .map(|((name, buffer), trim)| LoadedSegment { name, buffer, trim })
            .collect();

        compose(loaded, &timeline_for_compose, crossfade_ms)
    })
    .await
    .map_err(|e| AudioError::internal(format!("composition task panicked: {e}")))??;

    let segment_count = timeline.sources.len();
    let meta = FilenameMeta {
        segment_count,
        silence_count: composition
            .report
            .entries
            .iter()
            .filter(|e| matches!(e, ReportEntry::Silence { .. }))
            .count(),
        natural_pause: composition
            .report
            .entries
            .iter()
            .any(|e| matches!(e, ReportEntry::Pause { .. }))
            .then_some((params.pause_duration_ms, params.pause_variation_ms)),
        crossfade_ms: params.crossfade_ms,
        leveled: params.normalize_levels,
        trim_threshold_ms: params.trim.then_some(params.trim_threshold_ms),
    };
    let stem = generate_stem(params.output_filename.as_deref(), &meta);

    let encoded = encode_all(&composition.buffer, &params.export_formats, &stem).await?;

    let total_duration_ms = composition.buffer.duration_ms();
    info!(
        segments = segment_count,
        duration_ms = total_duration_ms as u64,
        formats = encoded.len(),
        "composition complete"
    );

    Ok(PipelineOutput {
        report: composition.report,
        encoded,
        total_duration_ms,
        sample_rate: composition.buffer.sample_rate,
        segment_count,
    })
}

/// Result of a standalone trim run.
#[derive(Debug)]
pub struct TrimOutput {
    pub result: TrimResult,
    pub encoded: Vec<EncodedOutput>,
    pub sample_rate: u32,
}

/// Trim one file's edges and re-encode it.
#[instrument(skip_all, fields(source = %source_name))]
pub async fn run_trim(
    source_name: &str,
    threshold_ms: u32,
    formats: &[ExportFormat],
    output_filename: Option<&str>,
    resolver: &dyn SourceResolver,
) -> AudioResult<TrimOutput> {
    let path = resolver.resolve(source_name)?;
    let name = source_name.to_string();

    let outcome = tokio::task::spawn_blocking(move || {
        let decoded = decode_file(&path, &name)?;
        Ok::<_, AudioError>(trim_edges(&decoded, threshold_ms))
    })
    .await
    .map_err(|e| AudioError::internal(format!("trim task panicked: {e}")))??;

    let meta = FilenameMeta {
        segment_count: 1,
        trim_threshold_ms: Some(threshold_ms),
        ..FilenameMeta::default()
    };
    let stem = generate_stem(output_filename, &meta);
    let encoded = encode_all(&outcome.buffer, formats, &stem).await?;

    Ok(TrimOutput {
        result: outcome.result,
        encoded,
        sample_rate: outcome.buffer.sample_rate,
    })
}
