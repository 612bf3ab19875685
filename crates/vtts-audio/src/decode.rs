//! Audio file decoding via symphonia.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::buffer::AudioBuffer;
use crate::error::{AudioError, AudioResult};

/// Decode an audio file into a mono buffer at its native sample rate.
///
/// Multi-channel sources are downmixed by channel averaging. Supported
/// containers/codecs follow the enabled symphonia features (wav, mp3, flac).
pub fn decode_file(path: &Path, name: &str) -> AudioResult<AudioBuffer> {
    let src = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AudioError::FileNotFound(path.to_path_buf())
        } else {
            AudioError::Io(e)
        }
    })?;

    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| AudioError::decode(name, format!("unrecognized container: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::decode(name, "no decodable audio track"))?;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(|e| AudioError::decode(name, format!("unsupported codec: {e}")))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::decode(name, "missing sample rate"))?;

    let mut pcm = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => return Err(AudioError::decode(name, e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| AudioError::decode(name, e.to_string()))?;

        match decoded {
            AudioBufferRef::F32(data) => downmix(&mut pcm, &data),
            AudioBufferRef::F64(data) => downmix(&mut pcm, &data),
            AudioBufferRef::U8(data) => downmix(&mut pcm, &data),
            AudioBufferRef::U16(data) => downmix(&mut pcm, &data),
            AudioBufferRef::U24(data) => downmix(&mut pcm, &data),
            AudioBufferRef::U32(data) => downmix(&mut pcm, &data),
            AudioBufferRef::S8(data) => downmix(&mut pcm, &data),
            AudioBufferRef::S16(data) => downmix(&mut pcm, &data),
            AudioBufferRef::S24(data) => downmix(&mut pcm, &data),
            AudioBufferRef::S32(data) => downmix(&mut pcm, &data),
        }
    }

    if pcm.is_empty() {
        return Err(AudioError::decode(name, "no audio frames decoded"));
    }

    Ok(AudioBuffer::new(pcm, sample_rate))
}

/// Append channel-averaged frames to `out`.
fn downmix<T>(out: &mut Vec<f32>, buf: &symphonia::core::audio::AudioBuffer<T>)
where
    T: symphonia::core::sample::Sample,
    f32: FromSample<T>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    if channels == 1 {
        out.extend(buf.chan(0).iter().map(|&v| f32::from_sample(v)));
        return;
    }
    out.reserve(frames);
    for frame in 0..frames {
        let mut acc = 0.0f32;
        for ch in 0..channels {
            acc += f32::from_sample(buf.chan(ch)[frame]);
        }
        out.push(acc / channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..16_000)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16_000.0).sin() * 0.5)
            .collect();
        write_wav(&path, &samples, 16_000, 1);

        let buf = decode_file(&path, "tone.wav").unwrap();
        assert_eq!(buf.sample_rate, 16_000);
        assert_eq!(buf.len(), 16_000);
    }

    #[test]
    fn test_decode_stereo_downmixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // Interleaved L/R frames
        let samples: Vec<f32> = (0..8_000).flat_map(|_| [0.5, -0.5]).collect();
        write_wav(&path, &samples, 16_000, 2);

        let buf = decode_file(&path, "stereo.wav").unwrap();
        assert_eq!(buf.len(), 8_000);
        // Opposite-phase channels cancel to near zero
        assert!(buf.samples.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_missing_file() {
        let err = decode_file(Path::new("/nonexistent/x.wav"), "x.wav").unwrap_err();
        assert!(matches!(err, AudioError::FileNotFound(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"this is not audio data at all").unwrap();
        drop(f);

        // A file that exists but cannot be probed is a decode failure,
        // not a caller mistake
        let err = decode_file(&path, "junk.wav").unwrap_err();
        assert!(matches!(err, AudioError::Decode { .. }));
        assert!(!err.is_input_error());
    }
}
