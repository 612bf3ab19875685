//! Per-segment level normalization.
//!
//! Each segment gets its own gain toward the median segment RMS, so
//! heterogeneous source loudness does not produce volume jumps at
//! boundaries. A single global gain could not fix that.

use crate::buffer::AudioBuffer;

/// Gain adjustments are limited to this many dB in either direction.
const MAX_GAIN_DB: f32 = 20.0;
/// Adjustments smaller than this are inaudible and skipped.
const MIN_GAIN_DB: f32 = 0.5;
/// Peak ceiling after applying gain.
const PEAK_CEILING: f32 = 0.99;

/// Full-buffer RMS.
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Scale each buffer toward the median RMS across all buffers.
///
/// Gains are clamped to ±20 dB and reduced further where they would push a
/// peak past full scale. Buffers that are effectively silent are left alone.
pub fn normalize_levels(buffers: &mut [AudioBuffer]) {
    let rms_values: Vec<f32> = buffers
        .iter()
        .map(|b| rms(&b.samples))
        .filter(|&r| r > 1e-6)
        .collect();

    if rms_values.is_empty() {
        return;
    }

    let mut sorted = rms_values;
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let target_rms = sorted[sorted.len() / 2];
    if target_rms < 1e-6 {
        return;
    }

    for buffer in buffers.iter_mut() {
        let buffer_rms = rms(&buffer.samples);
        if buffer_rms < 1e-6 {
            continue;
        }

        let db_adjust = (20.0 * (target_rms / buffer_rms).log10()).clamp(-MAX_GAIN_DB, MAX_GAIN_DB);
        if db_adjust.abs() < MIN_GAIN_DB {
            continue;
        }

        let mut gain = 10.0f32.powf(db_adjust / 20.0);

        let peak = buffer
            .samples
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak * gain > PEAK_CEILING {
            gain = PEAK_CEILING / peak;
        }

        for s in buffer.samples.iter_mut() {
            *s *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(level: f32, len: usize) -> AudioBuffer {
        AudioBuffer::new(vec![level; len], 16_000)
    }

    #[test]
    fn test_converges_toward_median() {
        let mut buffers = vec![constant(0.05, 1000), constant(0.2, 1000), constant(0.6, 1000)];
        normalize_levels(&mut buffers);

        let rms_values: Vec<f32> = buffers.iter().map(|b| rms(&b.samples)).collect();
        // Quiet segment boosted, loud segment attenuated, median untouched
        assert!((rms_values[0] - 0.2).abs() < 0.01);
        assert!((rms_values[1] - 0.2).abs() < 1e-6);
        assert!((rms_values[2] - 0.2).abs() < 0.01);
    }

    #[test]
    fn test_gain_never_clips() {
        // Quiet RMS but with a full-scale spike: boosting naively would clip
        let mut spiky = vec![0.01f32; 1000];
        spiky[500] = 0.95;
        let mut buffers = vec![AudioBuffer::new(spiky, 16_000), constant(0.5, 1000)];
        normalize_levels(&mut buffers);

        let peak = buffers[0]
            .samples
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= PEAK_CEILING + 1e-6);
    }

    #[test]
    fn test_silent_buffers_untouched() {
        let mut buffers = vec![constant(0.0, 1000), constant(0.3, 1000)];
        let before = buffers[0].clone();
        normalize_levels(&mut buffers);
        assert_eq!(buffers[0], before);
    }

    #[test]
    fn test_empty_input_is_noop() {
        let mut buffers: Vec<AudioBuffer> = vec![];
        normalize_levels(&mut buffers);
    }
}
