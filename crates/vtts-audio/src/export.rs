//! Multi-format export and output filename generation.
//!
//! WAV is encoded in-process with `hound`; MP3 and FLAC are produced by
//! routing a temporary WAV through FFmpeg. Any single format failure aborts
//! the whole export so callers never receive a partial format set.

use std::io::Cursor;
use std::path::Path;

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use vtts_models::ExportFormat;

use crate::buffer::AudioBuffer;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{AudioError, AudioResult};

const MP3_BITRATE: &str = "192k";
const ENCODE_TIMEOUT_SECS: u64 = 120;

/// Parameters folded into the generated filename for human traceability.
#[derive(Debug, Clone, Default)]
pub struct FilenameMeta {
    pub segment_count: usize,
    pub silence_count: usize,
    /// (base_ms, variation_ms) when natural pauses were inserted.
    pub natural_pause: Option<(u32, u32)>,
    pub crossfade_ms: u32,
    pub leveled: bool,
    /// Trim threshold when trimming was requested.
    pub trim_threshold_ms: Option<u32>,
}

/// One encoded output stream.
#[derive(Debug, Clone)]
pub struct EncodedOutput {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Generate the output filename stem.
///
/// A custom stem is sanitized and used as-is; otherwise the stem encodes a
/// timestamp, a microsecond+random collision component, and the key
/// composition parameters.
pub fn generate_stem(custom: Option<&str>, meta: &FilenameMeta) -> String {
    if let Some(custom) = custom {
        let sanitized = sanitize_stem(custom);
        if !sanitized.is_empty() {
            return sanitized;
        }
    }

    let mut stem = format!("{}_{}seg", timestamp_stem("concat"), meta.segment_count);

    if meta.silence_count > 0 {
        stem.push_str(&format!("_sil{}", meta.silence_count));
    }
    if let Some((base_ms, variation_ms)) = meta.natural_pause {
        stem.push_str(&format!("_pause{}v{}", base_ms, variation_ms));
    }
    if meta.crossfade_ms > 0 {
        stem.push_str(&format!("_fade{}", meta.crossfade_ms));
    }
    if meta.leveled {
        stem.push_str("_leveled");
    }
    if let Some(threshold_ms) = meta.trim_threshold_ms {
        stem.push_str(&format!("_trim{}", threshold_ms));
    }

    stem
}

/// Collision-resistant stem: timestamp plus a microsecond+random component.
pub fn timestamp_stem(prefix: &str) -> String {
    let now = Utc::now();
    let nonce: u16 = rand::thread_rng().gen();
    format!(
        "{}_{}_{:06}{:04x}",
        prefix,
        now.format("%Y%m%d_%H%M%S"),
        now.timestamp_subsec_micros() % 1_000_000,
        nonce,
    )
}

/// Strip a caller-supplied stem down to filesystem-safe characters.
fn sanitize_stem(stem: &str) -> String {
    stem.trim()
        .trim_end_matches(".wav")
        .trim_end_matches(".mp3")
        .trim_end_matches(".flac")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Encode the composed buffer into every requested format.
///
/// Aborts on the first failing format rather than returning a partial set.
pub async fn encode_all(
    buffer: &AudioBuffer,
    formats: &[ExportFormat],
    stem: &str,
) -> AudioResult<Vec<EncodedOutput>> {
    if formats.is_empty() {
        return Err(AudioError::internal("no export formats requested"));
    }

    // WAV bytes double as the FFmpeg input for compressed formats.
    let wav_bytes = encode_wav(buffer)?;

    let mut outputs = Vec::with_capacity(formats.len());
    for format in formats {
        let bytes = match format {
            ExportFormat::Wav => wav_bytes.clone(),
            ExportFormat::Mp3 | ExportFormat::Flac => {
                encode_via_ffmpeg(*format, &wav_bytes, buffer.sample_rate).await?
            }
        };
        debug!(
            format = %format,
            bytes = bytes.len(),
            "encoded output"
        );
        outputs.push(EncodedOutput {
            format: *format,
            filename: format!("{}.{}", stem, format.extension()),
            bytes,
        });
    }

    Ok(outputs)
}

/// Encode mono 16-bit PCM WAV in memory.
pub fn encode_wav(buffer: &AudioBuffer) -> AudioResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AudioError::encoding(ExportFormat::Wav, e.to_string()))?;
        for &sample in &buffer.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .map_err(|e| AudioError::encoding(ExportFormat::Wav, e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::encoding(ExportFormat::Wav, e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Transcode WAV bytes through FFmpeg into a compressed format.
async fn encode_via_ffmpeg(
    format: ExportFormat,
    wav_bytes: &[u8],
    sample_rate: u32,
) -> AudioResult<Vec<u8>> {
    let work_dir = tempfile::tempdir()?;
    let input_path = work_dir.path().join("source.wav");
    let output_path = work_dir.path().join(format!("out.{}", format.extension()));

    tokio::fs::write(&input_path, wav_bytes).await?;

    let cmd = build_encode_command(format, &input_path, &output_path, sample_rate);
    FfmpegRunner::new()
        .with_timeout(ENCODE_TIMEOUT_SECS)
        .run(&cmd)
        .await
        .map_err(|e| match e {
            AudioError::FfmpegNotFound | AudioError::Timeout(_) => e,
            AudioError::FfmpegFailed { message, stderr, .. } => AudioError::encoding(
                format,
                match stderr {
                    Some(stderr) => format!("{message}: {stderr}"),
                    None => message,
                },
            ),
            other => AudioError::encoding(format, other.to_string()),
        })?;

    Ok(tokio::fs::read(&output_path).await?)
}

fn build_encode_command(
    format: ExportFormat,
    input: &Path,
    output: &Path,
    sample_rate: u32,
) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(input, output)
        .no_video()
        .sample_rate(sample_rate)
        .channels(1);

    match format {
        ExportFormat::Mp3 => cmd.audio_codec("libmp3lame").audio_bitrate(MP3_BITRATE),
        ExportFormat::Flac => cmd.audio_codec("flac"),
        ExportFormat::Wav => cmd.audio_codec("pcm_s16le"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> FilenameMeta {
        FilenameMeta {
            segment_count: 3,
            silence_count: 0,
            natural_pause: None,
            crossfade_ms: 0,
            leveled: false,
            trim_threshold_ms: None,
        }
    }

    #[test]
    fn test_stem_encodes_parameters() {
        let stem = generate_stem(
            None,
            &FilenameMeta {
                segment_count: 4,
                silence_count: 2,
                natural_pause: Some((600, 200)),
                crossfade_ms: 50,
                leveled: true,
                trim_threshold_ms: Some(200),
            },
        );
        assert!(stem.starts_with("concat_"));
        assert!(stem.contains("_4seg"));
        assert!(stem.contains("_sil2"));
        assert!(stem.contains("_pause600v200"));
        assert!(stem.contains("_fade50"));
        assert!(stem.contains("_leveled"));
        assert!(stem.ends_with("_trim200"));
    }

    #[test]
    fn test_stem_omits_absent_parameters() {
        let stem = generate_stem(None, &meta());
        assert!(stem.contains("_3seg"));
        assert!(!stem.contains("_sil"));
        assert!(!stem.contains("_pause"));
        assert!(!stem.contains("_fade"));
        assert!(!stem.contains("_leveled"));
        assert!(!stem.contains("_trim"));
    }

    #[test]
    fn test_custom_stem_sanitized() {
        assert_eq!(
            generate_stem(Some("my episode #1.wav"), &meta()),
            "my_episode__1"
        );
        assert_eq!(generate_stem(Some("take-2_final"), &meta()), "take-2_final");
    }

    #[test]
    fn test_blank_custom_stem_falls_back_to_generated() {
        let stem = generate_stem(Some("   "), &meta());
        assert!(stem.starts_with("concat_"));
    }

    #[test]
    fn test_generated_stems_do_not_collide() {
        let a = generate_stem(None, &meta());
        let b = generate_stem(None, &meta());
        assert_ne!(a, b);
    }

    #[test]
    fn test_wav_encoding_has_riff_header() {
        let buffer = AudioBuffer::new(vec![0.25; 1600], 16_000);
        let bytes = encode_wav(&buffer).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header + 2 bytes per sample
        assert_eq!(bytes.len(), 44 + 1600 * 2);
    }

    #[test]
    fn test_wav_encoding_clamps_out_of_range() {
        let buffer = AudioBuffer::new(vec![2.0, -2.0], 16_000);
        let bytes = encode_wav(&buffer).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples[0], i16::MAX);
        assert_eq!(samples[1], -i16::MAX);
    }
}
