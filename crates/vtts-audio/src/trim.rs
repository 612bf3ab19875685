//! Leading/trailing silence trimming.
//!
//! Edges are scanned with a short-window RMS profile. Only silence runs at
//! least `threshold_ms` long are removed, and a fixed safety margin is kept
//! before the first (and after the last) sustained energy so quiet
//! consonants and breaths survive the cut.

use vtts_models::TrimResult;

use crate::buffer::{ms_to_samples, AudioBuffer};

/// RMS analysis window.
const WINDOW_MS: f64 = 10.0;
/// Energy must stay above the floor for this long to count as speech onset.
const SUSTAIN_WINDOWS: usize = 3;
/// Linear RMS floor below which a window counts as silence (~-40 dBFS).
const SILENCE_FLOOR: f32 = 0.01;
/// Safety margin preserved at each trimmed edge.
pub const MARGIN_MS: f64 = 50.0;

/// A trimmed buffer together with its audit record.
#[derive(Debug, Clone)]
pub struct TrimOutcome {
    pub buffer: AudioBuffer,
    pub result: TrimResult,
}

/// Remove leading/trailing near-silence runs of at least `threshold_ms`.
///
/// Returns a new buffer; the input is never modified. When no eligible run
/// exists at either edge the outcome carries an unchanged copy with
/// `result.trimmed == false`.
pub fn trim_edges(buffer: &AudioBuffer, threshold_ms: u32) -> TrimOutcome {
    let original_ms = buffer.duration_ms();
    let unchanged = || TrimOutcome {
        buffer: buffer.clone(),
        result: TrimResult::unchanged(original_ms),
    };

    if buffer.is_empty() || buffer.sample_rate == 0 {
        return unchanged();
    }

    let window_len = ms_to_samples(WINDOW_MS, buffer.sample_rate).max(1);
    let margin = ms_to_samples(MARGIN_MS, buffer.sample_rate);
    let rms: Vec<f32> = buffer
        .samples
        .chunks(window_len)
        .map(window_rms)
        .collect();

    let first_active = first_sustained(&rms);
    let Some(first_active) = first_active else {
        // All-silence input: keep a minimum-length buffer, never error.
        if original_ms < threshold_ms as f64 {
            return unchanged();
        }
        let keep = (2 * margin).max(1).min(buffer.len());
        let trimmed = AudioBuffer::new(buffer.samples[..keep].to_vec(), buffer.sample_rate);
        let trimmed_ms = trimmed.duration_ms();
        return TrimOutcome {
            result: TrimResult {
                original_ms,
                trimmed_ms,
                leading_removed_ms: 0.0,
                trailing_removed_ms: original_ms - trimmed_ms,
                trimmed: keep < buffer.len(),
            },
            buffer: trimmed,
        };
    };

    let last_active = last_sustained(&rms).unwrap_or(first_active);

    let first_active_sample = first_active * window_len;
    let last_active_end = ((last_active + 1) * window_len).min(buffer.len());

    let threshold_samples = ms_to_samples(threshold_ms as f64, buffer.sample_rate);

    let start_cut = if first_active_sample >= threshold_samples {
        first_active_sample.saturating_sub(margin)
    } else {
        0
    };

    let trailing_run = buffer.len() - last_active_end;
    let end_cut = if trailing_run >= threshold_samples {
        (last_active_end + margin).min(buffer.len())
    } else {
        buffer.len()
    };

    if start_cut == 0 && end_cut == buffer.len() {
        return unchanged();
    }

    let trimmed = AudioBuffer::new(
        buffer.samples[start_cut..end_cut].to_vec(),
        buffer.sample_rate,
    );
    let to_ms = |n: usize| n as f64 * 1000.0 / buffer.sample_rate as f64;
    TrimOutcome {
        result: TrimResult {
            original_ms,
            trimmed_ms: trimmed.duration_ms(),
            leading_removed_ms: to_ms(start_cut),
            trailing_removed_ms: to_ms(buffer.len() - end_cut),
            trimmed: true,
        },
        buffer: trimmed,
    }
}

fn window_rms(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = window.iter().map(|s| s * s).sum();
    (sum_sq / window.len() as f32).sqrt()
}

/// First window index where energy stays above the floor for the sustain run.
fn first_sustained(rms: &[f32]) -> Option<usize> {
    if rms.len() >= SUSTAIN_WINDOWS {
        let found = (0..=rms.len() - SUSTAIN_WINDOWS)
            .find(|&i| rms[i..i + SUSTAIN_WINDOWS].iter().all(|&r| r > SILENCE_FLOOR));
        if found.is_some() {
            return found;
        }
    }
    // Short buffers or isolated bursts: fall back to any active window
    rms.iter().position(|&r| r > SILENCE_FLOOR)
}

/// Last window index where sustained energy ends (mirror of `first_sustained`).
fn last_sustained(rms: &[f32]) -> Option<usize> {
    if rms.len() >= SUSTAIN_WINDOWS {
        let found = (0..=rms.len() - SUSTAIN_WINDOWS)
            .rev()
            .find(|&i| rms[i..i + SUSTAIN_WINDOWS].iter().all(|&r| r > SILENCE_FLOOR))
            .map(|i| i + SUSTAIN_WINDOWS - 1);
        if found.is_some() {
            return found;
        }
    }
    rms.iter().rposition(|&r| r > SILENCE_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 16_000;

    fn tone(ms: u64) -> Vec<f32> {
        let len = ms_to_samples(ms as f64, SR);
        (0..len)
            .map(|i| (i as f32 * 220.0 * 2.0 * std::f32::consts::PI / SR as f32).sin() * 0.5)
            .collect()
    }

    fn padded(lead_ms: u64, tone_ms: u64, tail_ms: u64) -> AudioBuffer {
        let mut samples = vec![0.0; ms_to_samples(lead_ms as f64, SR)];
        samples.extend(tone(tone_ms));
        samples.extend(vec![0.0; ms_to_samples(tail_ms as f64, SR)]);
        AudioBuffer::new(samples, SR)
    }

    #[test]
    fn test_trims_both_edges_with_margin() {
        let buf = padded(300, 500, 400);
        let outcome = trim_edges(&buf, 200);
        assert!(outcome.result.trimmed);
        assert!((outcome.result.leading_removed_ms - 250.0).abs() < WINDOW_MS + 1.0);
        assert!((outcome.result.trailing_removed_ms - 350.0).abs() < WINDOW_MS + 1.0);
        // 50 ms margin + 500 ms tone + 50 ms margin
        assert!((outcome.buffer.duration_ms() - 600.0).abs() < 2.0 * WINDOW_MS + 2.0);
    }

    #[test]
    fn test_short_runs_left_untouched() {
        // 100 ms edges are below the 200 ms threshold
        let buf = padded(100, 500, 100);
        let outcome = trim_edges(&buf, 200);
        assert!(!outcome.result.trimmed);
        assert_eq!(outcome.buffer, buf);
    }

    #[test]
    fn test_idempotent() {
        let buf = padded(400, 500, 400);
        let first = trim_edges(&buf, 200);
        assert!(first.result.trimmed);

        let second = trim_edges(&first.buffer, 200);
        assert!(!second.result.trimmed);
        assert_eq!(second.buffer, first.buffer);
    }

    #[test]
    fn test_margin_preserves_onset() {
        let buf = padded(300, 500, 0);
        let outcome = trim_edges(&buf, 200);
        let removed = ms_to_samples(outcome.result.leading_removed_ms, SR);
        let onset = ms_to_samples(300.0, SR);
        // Never cuts within the margin of the first non-silent sample
        assert!(onset - removed >= ms_to_samples(MARGIN_MS, SR) - ms_to_samples(WINDOW_MS, SR));
    }

    #[test]
    fn test_all_silence_keeps_minimum() {
        let buf = AudioBuffer::new(vec![0.0; SR as usize], SR); // 1 s of silence
        let outcome = trim_edges(&buf, 200);
        assert!(outcome.result.trimmed);
        assert!(outcome.buffer.len() > 0);
        assert!((outcome.buffer.duration_ms() - 2.0 * MARGIN_MS).abs() < 1.0);
    }

    #[test]
    fn test_empty_buffer_noop() {
        let buf = AudioBuffer::new(vec![], SR);
        let outcome = trim_edges(&buf, 200);
        assert!(!outcome.result.trimmed);
    }
}
