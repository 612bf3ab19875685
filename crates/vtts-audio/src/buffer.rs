//! Decoded PCM audio buffers.

/// Mono PCM audio with a sample rate.
///
/// The decoder downmixes multi-channel sources on load, so everything past
/// the decode boundary works on single-channel f32 samples. Pipeline stages
/// produce new buffers instead of mutating their input in place; the
/// original stays available for before/after reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap samples at the given rate.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// All-zero buffer of the given duration.
    pub fn silence(duration_ms: u64, sample_rate: u32) -> Self {
        let len = ms_to_samples(duration_ms as f64, sample_rate);
        Self {
            samples: vec![0.0; len],
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 * 1000.0 / self.sample_rate as f64
    }
}

/// Convert a millisecond duration to a sample count at the given rate.
pub fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    (ms * sample_rate as f64 / 1000.0).round() as usize
}
