//! Processing reports and composition output summaries.

use serde::{Deserialize, Serialize};

/// Per-segment trim record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimResult {
    /// Duration before trimming, in milliseconds.
    pub original_ms: f64,
    /// Duration after trimming, in milliseconds.
    pub trimmed_ms: f64,
    /// Leading near-silence removed, in milliseconds.
    pub leading_removed_ms: f64,
    /// Trailing near-silence removed, in milliseconds.
    pub trailing_removed_ms: f64,
    /// Whether any trimming was actually applied.
    pub trimmed: bool,
}

impl TrimResult {
    /// An untouched buffer of the given duration.
    pub fn unchanged(duration_ms: f64) -> Self {
        Self {
            original_ms: duration_ms,
            trimmed_ms: duration_ms,
            leading_removed_ms: 0.0,
            trailing_removed_ms: 0.0,
            trimmed: false,
        }
    }
}

/// One entry of the processing audit trail, in final timeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEntry {
    /// An audio segment laid down on the timeline.
    Segment {
        /// Source file name (or `upload:<index>`)
        name: String,
        /// Final duration on the timeline, in milliseconds
        duration_ms: f64,
        /// Trim details when trimming was requested
        #[serde(skip_serializing_if = "Option::is_none")]
        trim: Option<TrimResult>,
    },
    /// An explicit silence folded in from the segment list.
    Silence {
        /// Exact requested duration, in milliseconds
        duration_ms: u64,
    },
    /// A natural pause sampled from the global pause parameters.
    Pause {
        /// Sampled duration actually inserted, in milliseconds
        duration_ms: u64,
        /// Configured base duration, in milliseconds
        base_ms: u32,
        /// Signed variation applied on top of the base
        variation_applied_ms: i64,
    },
}

impl ReportEntry {
    /// Timeline duration contributed by this entry, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        match self {
            ReportEntry::Segment { duration_ms, .. } => *duration_ms,
            ReportEntry::Silence { duration_ms } => *duration_ms as f64,
            ReportEntry::Pause { duration_ms, .. } => *duration_ms as f64,
        }
    }
}

/// Ordered audit trail of one composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub entries: Vec<ReportEntry>,
}

impl ProcessingReport {
    /// Sum of all entry durations, in milliseconds.
    pub fn total_ms(&self) -> f64 {
        self.entries.iter().map(ReportEntry::duration_ms).sum()
    }

    /// Number of audio segments on the timeline.
    pub fn segment_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, ReportEntry::Segment { .. }))
            .count()
    }
}

/// One stored encoded output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub format: crate::format::ExportFormat,
    pub filename: String,
    pub size_bytes: u64,
    /// Download URL, present in url-mode responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// JSON summary of a finished composition (url-mode response body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionOutput {
    pub files: Vec<OutputFile>,
    pub total_duration_ms: f64,
    pub sample_rate: u32,
    pub segment_count: usize,
    pub report: ProcessingReport,
}
