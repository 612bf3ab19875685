//! Segment descriptors for mixed-source concatenation requests.

use serde::{Deserialize, Serialize};

/// One element of a mixed-source segment list.
///
/// Server files reference the outputs directory, uploads index into the
/// multipart file collection accompanying the request, and silences carry
/// only a duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentSpec {
    /// A file already present in the outputs directory.
    ServerFile {
        /// Path relative to the outputs directory
        source: String,
    },
    /// An uploaded file, by position in the accompanying upload collection.
    Upload {
        /// Zero-based index into the uploaded files
        index: usize,
    },
    /// An explicit silence between two audio segments.
    Silence {
        /// Silence duration in milliseconds (bounded at parse time)
        duration_ms: u64,
    },
}

impl SegmentSpec {
    /// Whether this spec resolves to audio data (as opposed to a silence marker).
    pub fn is_audio(&self) -> bool {
        !matches!(self, SegmentSpec::Silence { .. })
    }
}
