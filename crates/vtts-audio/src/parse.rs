//! Segment list parsing.
//!
//! Turns the raw request segment list into an ordered sequence of typed
//! descriptors. Silence entries are kept as markers here; folding them into
//! gaps happens in [`crate::gaps`].

use vtts_models::SegmentSpec;

use crate::error::{AudioError, AudioResult};

/// Upper bound on one explicit silence, in milliseconds.
///
/// Silence is materialized as zeroed samples at composition time, so an
/// unbounded duration would let a few request bytes demand an arbitrarily
/// large allocation.
pub const MAX_SILENCE_MS: u64 = 60_000;

/// Where an audio segment's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Filename relative to the outputs directory.
    ServerFile(String),
    /// Index into the request's uploaded-file collection.
    Uploaded(usize),
}

impl AudioSource {
    /// Human-readable name used in reports and error messages.
    pub fn display_name(&self) -> String {
        match self {
            AudioSource::ServerFile(name) => name.clone(),
            AudioSource::Uploaded(index) => format!("upload:{index}"),
        }
    }
}

/// One parsed element of the ordered segment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSegment {
    Audio(AudioSource),
    SilenceMarker { duration_ms: u64 },
}

/// Parse server-file mode input: bare filenames and `"(1.5s)"` notations.
pub fn parse_file_list(files: &[String]) -> AudioResult<Vec<ParsedSegment>> {
    let mut segments = Vec::with_capacity(files.len());
    for token in files {
        segments.push(parse_token(token)?);
    }
    require_audio(&segments)?;
    Ok(segments)
}

/// Parse mixed-mode typed descriptors, validating upload indices.
pub fn parse_segment_specs(
    specs: &[SegmentSpec],
    upload_count: usize,
) -> AudioResult<Vec<ParsedSegment>> {
    let mut segments = Vec::with_capacity(specs.len());
    for spec in specs {
        let segment = match spec {
            SegmentSpec::ServerFile { source } => {
                ParsedSegment::Audio(AudioSource::ServerFile(source.clone()))
            }
            SegmentSpec::Upload { index } => {
                if *index >= upload_count {
                    return Err(AudioError::InvalidUploadIndex {
                        index: *index,
                        upload_count,
                    });
                }
                ParsedSegment::Audio(AudioSource::Uploaded(*index))
            }
            SegmentSpec::Silence { duration_ms } => {
                check_silence_bound(*duration_ms)?;
                ParsedSegment::SilenceMarker {
                    duration_ms: *duration_ms,
                }
            }
        };
        segments.push(segment);
    }
    require_audio(&segments)?;
    Ok(segments)
}

/// A list with no audio content cannot be concatenated.
fn require_audio(segments: &[ParsedSegment]) -> AudioResult<()> {
    if segments
        .iter()
        .any(|s| matches!(s, ParsedSegment::Audio(_)))
    {
        Ok(())
    } else {
        Err(AudioError::NoAudioSegments)
    }
}

fn parse_token(token: &str) -> AudioResult<ParsedSegment> {
    let trimmed = token.trim();
    if let Some(inner) = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let duration_ms = parse_silence_notation(inner)
            .ok_or_else(|| AudioError::InvalidSilenceNotation(trimmed.to_string()))?;
        check_silence_bound(duration_ms)?;
        return Ok(ParsedSegment::SilenceMarker { duration_ms });
    }
    if trimmed.is_empty() {
        return Err(AudioError::InvalidSilenceNotation(token.to_string()));
    }
    Ok(ParsedSegment::Audio(AudioSource::ServerFile(
        trimmed.to_string(),
    )))
}

fn check_silence_bound(duration_ms: u64) -> AudioResult<()> {
    if duration_ms > MAX_SILENCE_MS {
        return Err(AudioError::SilenceTooLong {
            requested_ms: duration_ms,
            max_ms: MAX_SILENCE_MS,
        });
    }
    Ok(())
}

/// Parse the inside of a silence notation: `<number><unit>` with unit s or ms.
fn parse_silence_notation(inner: &str) -> Option<u64> {
    let inner = inner.trim();
    let (number, to_ms) = if let Some(n) = inner.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = inner.strip_suffix('s') {
        (n, 1000.0)
    } else {
        return None;
    };

    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * to_ms).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_silence_notation_units() {
        let segments =
            parse_file_list(&strings(&["a.wav", "(1.5s)", "(500ms)", "(0.25s)"])).unwrap();
        assert_eq!(
            segments[1],
            ParsedSegment::SilenceMarker { duration_ms: 1500 }
        );
        assert_eq!(
            segments[2],
            ParsedSegment::SilenceMarker { duration_ms: 500 }
        );
        assert_eq!(
            segments[3],
            ParsedSegment::SilenceMarker { duration_ms: 250 }
        );
    }

    #[test]
    fn test_bare_filename_is_server_file() {
        let segments = parse_file_list(&strings(&["intro (final).wav"])).unwrap();
        // Parentheses inside a filename do not make it a silence notation
        assert_eq!(
            segments[0],
            ParsedSegment::Audio(AudioSource::ServerFile("intro (final).wav".to_string()))
        );
    }

    #[test]
    fn test_invalid_notations_rejected() {
        for bad in ["(1.5m)", "(abc s)", "(-1s)", "(s)", "()", "(1.5)"] {
            let err = parse_file_list(&strings(&["a.wav", bad])).unwrap_err();
            assert!(
                matches!(err, AudioError::InvalidSilenceNotation(_)),
                "expected notation error for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_overlong_silence_rejected() {
        // A few request bytes must never demand a multi-terabyte buffer
        let err = parse_file_list(&strings(&["a.wav", "(999999999s)", "b.wav"])).unwrap_err();
        match err {
            AudioError::SilenceTooLong {
                requested_ms,
                max_ms,
            } => {
                assert_eq!(requested_ms, 999_999_999_000);
                assert_eq!(max_ms, MAX_SILENCE_MS);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let specs = vec![
            SegmentSpec::Upload { index: 0 },
            SegmentSpec::Silence {
                duration_ms: MAX_SILENCE_MS + 1,
            },
        ];
        let err = parse_segment_specs(&specs, 1).unwrap_err();
        assert!(matches!(err, AudioError::SilenceTooLong { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_silence_bound_is_inclusive() {
        let segments = parse_file_list(&strings(&["a.wav", "(60s)"])).unwrap();
        assert_eq!(
            segments[1],
            ParsedSegment::SilenceMarker {
                duration_ms: MAX_SILENCE_MS
            }
        );
        assert!(parse_file_list(&strings(&["a.wav", "(60001ms)"])).is_err());
    }

    #[test]
    fn test_pure_silence_rejected() {
        let err = parse_file_list(&strings(&["(1s)", "(2s)"])).unwrap_err();
        assert!(matches!(err, AudioError::NoAudioSegments));

        let err = parse_file_list(&[]).unwrap_err();
        assert!(matches!(err, AudioError::NoAudioSegments));
    }

    #[test]
    fn test_upload_index_bounds() {
        let specs = vec![SegmentSpec::Upload { index: 2 }];
        let err = parse_segment_specs(&specs, 1).unwrap_err();
        match err {
            AudioError::InvalidUploadIndex {
                index,
                upload_count,
            } => {
                assert_eq!(index, 2);
                assert_eq!(upload_count, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_mixed_specs() {
        let specs = vec![
            SegmentSpec::Upload { index: 0 },
            SegmentSpec::Silence { duration_ms: 300 },
            SegmentSpec::ServerFile {
                source: "outro.wav".to_string(),
            },
        ];
        let segments = parse_segment_specs(&specs, 1).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[0],
            ParsedSegment::Audio(AudioSource::Uploaded(0))
        );
        assert_eq!(
            segments[1],
            ParsedSegment::SilenceMarker { duration_ms: 300 }
        );
    }
}
