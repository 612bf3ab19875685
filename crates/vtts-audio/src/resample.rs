//! Sample-rate conversion via rubato.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::buffer::AudioBuffer;
use crate::error::{AudioError, AudioResult};

/// Resample a mono buffer to `target_rate`.
///
/// Returns the input unchanged when the rates already match.
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> AudioResult<AudioBuffer> {
    if buffer.sample_rate == target_rate || buffer.is_empty() {
        return Ok(AudioBuffer::new(buffer.samples.clone(), target_rate));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        target_rate as f64 / buffer.sample_rate as f64,
        2.0,
        params,
        buffer.len(),
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let input = vec![buffer.samples.clone()];
    let output = resampler
        .process(&input, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let samples = output.into_iter().next().unwrap_or_default();
    Ok(AudioBuffer::new(samples, target_rate))
}
