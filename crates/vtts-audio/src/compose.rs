//! Timeline assembly.
//!
//! Lays segments down in order, inserting resolved gap silence between them.
//! Crossfade applies only at audio-to-audio boundaries whose gap is
//! `Direct`; once silence is requested at a boundary (explicitly or as a
//! natural pause), both sides get a clean cut.

use vtts_models::{ProcessingReport, ReportEntry, TrimResult};

use crate::buffer::{ms_to_samples, AudioBuffer};
use crate::error::{AudioError, AudioResult};
use crate::gaps::{GapPolicy, Timeline};
use crate::resample::resample;

/// One audio segment ready for composition.
#[derive(Debug, Clone)]
pub struct LoadedSegment {
    /// Report/display name (file name or `upload:<index>`).
    pub name: String,
    pub buffer: AudioBuffer,
    /// Trim audit when trimming was requested.
    pub trim: Option<TrimResult>,
}

/// A composed timeline with its audit trail.
#[derive(Debug, Clone)]
pub struct Composition {
    pub buffer: AudioBuffer,
    pub report: ProcessingReport,
}

/// Assemble loaded segments along a resolved timeline.
///
/// Segments are resampled to the first segment's rate before assembly.
/// Report entries appear in timeline order, one per segment and one per
/// non-zero gap; a crossfaded segment's reported duration excludes the
/// blended overlap, so entry durations always sum to the output duration.
pub fn compose(
    segments: Vec<LoadedSegment>,
    timeline: &Timeline,
    crossfade_ms: u32,
) -> AudioResult<Composition> {
    if segments.is_empty() {
        return Err(AudioError::NoAudioSegments);
    }
    if segments.len() != timeline.sources.len() || timeline.gaps.len() + 1 != segments.len() {
        return Err(AudioError::internal(format!(
            "timeline mismatch: {} segments, {} sources, {} gaps",
            segments.len(),
            timeline.sources.len(),
            timeline.gaps.len()
        )));
    }

    let target_rate = segments[0].buffer.sample_rate;
    if target_rate == 0 {
        return Err(AudioError::internal("zero sample rate on first segment"));
    }
    let crossfade_samples = ms_to_samples(crossfade_ms as f64, target_rate);

    let mut out: Vec<f32> = Vec::new();
    let mut entries: Vec<ReportEntry> = Vec::new();

    if timeline.leading_silence_ms > 0 {
        append_silence(&mut out, timeline.leading_silence_ms, target_rate);
        entries.push(ReportEntry::Silence {
            duration_ms: timeline.leading_silence_ms,
        });
    }

    for (i, segment) in segments.into_iter().enumerate() {
        let resampled = resample(&segment.buffer, target_rate)?;
        let full_ms = resampled.duration_ms();

        let mut overlap = 0usize;
        if i > 0 {
            let gap = &timeline.gaps[i - 1];
            if gap.duration_ms > 0 {
                append_silence(&mut out, gap.duration_ms, target_rate);
                entries.push(gap_entry(gap));
            } else if matches!(gap.policy, GapPolicy::Direct) && crossfade_samples > 0 {
                overlap = crossfade_into(&mut out, &resampled.samples, crossfade_samples);
            }
        }

        out.extend_from_slice(&resampled.samples[overlap..]);
        let overlap_ms = overlap as f64 * 1000.0 / target_rate as f64;
        entries.push(ReportEntry::Segment {
            name: segment.name,
            duration_ms: full_ms - overlap_ms,
            trim: segment.trim,
        });
    }

    if timeline.trailing_silence_ms > 0 {
        append_silence(&mut out, timeline.trailing_silence_ms, target_rate);
        entries.push(ReportEntry::Silence {
            duration_ms: timeline.trailing_silence_ms,
        });
    }

    Ok(Composition {
        buffer: AudioBuffer::new(out, target_rate),
        report: ProcessingReport { entries },
    })
}

fn gap_entry(gap: &crate::gaps::ResolvedGap) -> ReportEntry {
    match gap.policy {
        GapPolicy::Explicit { duration_ms } => ReportEntry::Silence { duration_ms },
        GapPolicy::Natural { base_ms, .. } => ReportEntry::Pause {
            duration_ms: gap.duration_ms,
            base_ms,
            variation_applied_ms: gap.variation_applied_ms,
        },
        // Direct gaps have zero duration and never produce an entry
        GapPolicy::Direct => unreachable!("direct gap has no silence entry"),
    }
}

fn append_silence(out: &mut Vec<f32>, duration_ms: u64, sample_rate: u32) {
    out.extend(std::iter::repeat(0.0).take(ms_to_samples(duration_ms as f64, sample_rate)));
}

/// Linearly blend the head of `incoming` over the tail of `out`.
///
/// Returns the overlap consumed from `incoming` (0 when either side is too
/// short for any blending).
fn crossfade_into(out: &mut [f32], incoming: &[f32], crossfade_samples: usize) -> usize {
    let n = crossfade_samples.min(out.len()).min(incoming.len());
    if n == 0 {
        return 0;
    }
    let tail_start = out.len() - n;
    for i in 0..n {
        let t = (i + 1) as f32 / (n + 1) as f32;
        let a = out[tail_start + i];
        let b = incoming[i];
        out[tail_start + i] = a * (1.0 - t) + b * t;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps::ResolvedGap;
    use crate::parse::AudioSource;

    const SR: u32 = 16_000;

    fn seg(name: &str, level: f32, ms: u64) -> LoadedSegment {
        LoadedSegment {
            name: name.to_string(),
            buffer: AudioBuffer::new(vec![level; ms_to_samples(ms as f64, SR)], SR),
            trim: None,
        }
    }

    fn source(name: &str) -> AudioSource {
        AudioSource::ServerFile(name.to_string())
    }

    fn explicit(ms: u64) -> ResolvedGap {
        ResolvedGap {
            policy: GapPolicy::Explicit { duration_ms: ms },
            duration_ms: ms,
            variation_applied_ms: 0,
        }
    }

    fn natural(ms: u64, base: u32, variation: i64) -> ResolvedGap {
        ResolvedGap {
            policy: GapPolicy::Natural {
                base_ms: base,
                variation_ms: 200,
            },
            duration_ms: ms,
            variation_applied_ms: variation,
        }
    }

    fn direct() -> ResolvedGap {
        ResolvedGap {
            policy: GapPolicy::Direct,
            duration_ms: 0,
            variation_applied_ms: 0,
        }
    }

    fn timeline(sources: Vec<AudioSource>, gaps: Vec<ResolvedGap>) -> Timeline {
        Timeline {
            leading_silence_ms: 0,
            sources,
            gaps,
            trailing_silence_ms: 0,
        }
    }

    #[test]
    fn test_plain_concatenation() {
        let tl = timeline(vec![source("a"), source("b")], vec![direct()]);
        let composition = compose(vec![seg("a", 0.5, 1000), seg("b", 0.5, 500)], &tl, 0).unwrap();
        assert!((composition.buffer.duration_ms() - 1500.0).abs() < 1e-6);
        assert_eq!(composition.report.entries.len(), 2);
    }

    #[test]
    fn test_crossfade_only_at_direct_boundaries() {
        // a -direct- b -explicit(500)- c -natural(600)- d, crossfade 300 ms
        let tl = timeline(
            vec![source("a"), source("b"), source("c"), source("d")],
            vec![direct(), explicit(500), natural(600, 600, 0)],
        );
        let segments = vec![
            seg("a", 0.5, 1000),
            seg("b", 0.5, 1000),
            seg("c", 0.5, 1000),
            seg("d", 0.5, 1000),
        ];
        let composition = compose(segments, &tl, 300).unwrap();

        // Only the direct boundary loses its 300 ms overlap
        let expected_ms = 4000.0 + 500.0 + 600.0 - 300.0;
        assert!((composition.buffer.duration_ms() - expected_ms).abs() < 1.0);

        // The explicit silence region is a clean cut: exactly zero samples
        let samples = &composition.buffer.samples;
        let b_end = ms_to_samples(1700.0, SR); // 1000 + 1000 - 300
        let silence_region = &samples[b_end..b_end + ms_to_samples(500.0, SR)];
        assert!(silence_region.iter().all(|&s| s == 0.0));

        // The blended region is neither a nor zero
        let blend_start = ms_to_samples(700.0, SR);
        let mid = samples[blend_start + ms_to_samples(150.0, SR)];
        assert!(mid > 0.0 && (mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_report_order_and_duration_accounting() {
        let tl = Timeline {
            leading_silence_ms: 0,
            sources: vec![source("intro.wav"), source("main.wav"), source("outro.wav")],
            gaps: vec![explicit(1000), natural(600, 600, 0)],
            trailing_silence_ms: 0,
        };
        let segments = vec![
            seg("intro.wav", 0.5, 2000),
            seg("main.wav", 0.5, 5000),
            seg("outro.wav", 0.5, 1500),
        ];
        let composition = compose(segments, &tl, 0).unwrap();

        let entries = &composition.report.entries;
        assert_eq!(entries.len(), 5);
        assert!(matches!(entries[0], ReportEntry::Segment { .. }));
        assert!(matches!(entries[1], ReportEntry::Silence { duration_ms: 1000 }));
        assert!(matches!(entries[2], ReportEntry::Segment { .. }));
        assert!(matches!(entries[3], ReportEntry::Pause { duration_ms: 600, .. }));
        assert!(matches!(entries[4], ReportEntry::Segment { .. }));

        // 2.0 + 1.0 + 5.0 + 0.6 + 1.5 = 10.1 s
        assert!((composition.report.total_ms() - 10_100.0).abs() < 1.0);
        assert!((composition.buffer.duration_ms() - composition.report.total_ms()).abs() < 1.0);
    }

    #[test]
    fn test_crossfaded_durations_still_sum() {
        let tl = timeline(vec![source("a"), source("b")], vec![direct()]);
        let composition = compose(vec![seg("a", 0.5, 1000), seg("b", 0.5, 1000)], &tl, 200).unwrap();
        assert!(
            (composition.report.total_ms() - composition.buffer.duration_ms()).abs() < 1e-6
        );
        assert!((composition.buffer.duration_ms() - 1800.0).abs() < 1.0);
    }

    #[test]
    fn test_resamples_to_first_segment_rate() {
        let tl = timeline(vec![source("a"), source("b")], vec![direct()]);
        let a = seg("a", 0.5, 1000);
        let b = LoadedSegment {
            name: "b".to_string(),
            buffer: AudioBuffer::new(vec![0.5; 8_000], 8_000), // 1 s at 8 kHz
            trim: None,
        };
        let composition = compose(vec![a, b], &tl, 0).unwrap();
        assert_eq!(composition.buffer.sample_rate, SR);
        assert!((composition.buffer.duration_ms() - 2000.0).abs() < 50.0);
    }

    #[test]
    fn test_edge_padding_reported() {
        let tl = Timeline {
            leading_silence_ms: 100,
            sources: vec![source("a")],
            gaps: vec![],
            trailing_silence_ms: 200,
        };
        let composition = compose(vec![seg("a", 0.5, 1000)], &tl, 0).unwrap();
        assert_eq!(composition.report.entries.len(), 3);
        assert!((composition.buffer.duration_ms() - 1300.0).abs() < 1.0);
    }

    #[test]
    fn test_timeline_mismatch_is_internal_error() {
        let tl = timeline(vec![source("a")], vec![]);
        let err = compose(
            vec![seg("a", 0.5, 100), seg("b", 0.5, 100)],
            &tl,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, AudioError::Internal(_)));
    }
}
