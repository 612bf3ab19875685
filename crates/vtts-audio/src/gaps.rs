//! Gap resolution between adjacent audio segments.
//!
//! Explicit silence markers fold into the gap at their position; every other
//! gap is decided independently from the global pause parameters. Resolution
//! is strictly per-gap — one explicit silence elsewhere in the list never
//! changes how the remaining gaps behave.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{AudioError, AudioResult};
use crate::parse::{AudioSource, ParsedSegment, MAX_SILENCE_MS};

/// How one gap between two adjacent audio segments is bridged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapPolicy {
    /// Caller-specified silence, exact duration.
    Explicit { duration_ms: u64 },
    /// Randomized pause from the global parameters.
    Natural { base_ms: u32, variation_ms: u32 },
    /// Zero-length join (crossfade-eligible).
    Direct,
}

/// A gap with its sampled duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedGap {
    pub policy: GapPolicy,
    /// Duration actually inserted on the timeline.
    pub duration_ms: u64,
    /// Signed variation applied on top of a natural gap's base.
    pub variation_applied_ms: i64,
}

/// Segment order with silences folded into per-gap policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    /// Explicit silence before the first audio segment, if any.
    pub leading_silence_ms: u64,
    /// Audio segments in final order.
    pub sources: Vec<AudioSource>,
    /// One resolved gap per adjacent source pair (`sources.len() - 1`).
    pub gaps: Vec<ResolvedGap>,
    /// Explicit silence after the last audio segment, if any.
    pub trailing_silence_ms: u64,
}

/// Fold silence markers into gaps and sample natural pause durations.
///
/// Consecutive silence markers sum into a single explicit gap. Markers
/// before the first or after the last audio segment become edge padding.
/// The RNG is injected so tests can pin the sampled durations.
pub fn resolve_timeline(
    segments: &[ParsedSegment],
    pause_duration_ms: u32,
    pause_variation_ms: u32,
    rng: &mut StdRng,
) -> AudioResult<Timeline> {
    let mut sources: Vec<AudioSource> = Vec::new();
    let mut gaps: Vec<ResolvedGap> = Vec::new();
    let mut leading_silence_ms = 0u64;
    let mut pending_silence: Option<u64> = None;

    for segment in segments {
        match segment {
            ParsedSegment::SilenceMarker { duration_ms } => {
                // Consecutive markers sum, so the bound holds for the fold too
                let folded = if sources.is_empty() {
                    leading_silence_ms += duration_ms;
                    leading_silence_ms
                } else {
                    let pending = pending_silence.get_or_insert(0);
                    *pending += duration_ms;
                    *pending
                };
                if folded > MAX_SILENCE_MS {
                    return Err(AudioError::SilenceTooLong {
                        requested_ms: folded,
                        max_ms: MAX_SILENCE_MS,
                    });
                }
            }
            ParsedSegment::Audio(source) => {
                if !sources.is_empty() {
                    gaps.push(resolve_gap(
                        pending_silence.take(),
                        pause_duration_ms,
                        pause_variation_ms,
                        rng,
                    ));
                }
                sources.push(source.clone());
            }
        }
    }

    if sources.is_empty() {
        return Err(AudioError::NoAudioSegments);
    }

    Ok(Timeline {
        leading_silence_ms,
        sources,
        gaps,
        trailing_silence_ms: pending_silence.unwrap_or(0),
    })
}

/// Resolve one gap independently of every other gap.
fn resolve_gap(
    explicit_ms: Option<u64>,
    pause_duration_ms: u32,
    pause_variation_ms: u32,
    rng: &mut StdRng,
) -> ResolvedGap {
    if let Some(duration_ms) = explicit_ms {
        return ResolvedGap {
            policy: GapPolicy::Explicit { duration_ms },
            duration_ms,
            variation_applied_ms: 0,
        };
    }

    if pause_duration_ms > 0 {
        let spread = pause_variation_ms as i64;
        let variation = if spread > 0 {
            rng.gen_range(-spread..=spread)
        } else {
            0
        };
        let duration_ms = (pause_duration_ms as i64 + variation).max(0) as u64;
        return ResolvedGap {
            policy: GapPolicy::Natural {
                base_ms: pause_duration_ms,
                variation_ms: pause_variation_ms,
            },
            duration_ms,
            variation_applied_ms: variation,
        };
    }

    ResolvedGap {
        policy: GapPolicy::Direct,
        duration_ms: 0,
        variation_applied_ms: 0,
    }
}
