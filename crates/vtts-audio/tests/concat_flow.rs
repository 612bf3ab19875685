//! End-to-end composition flow over real WAV files on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use vtts_audio::{
    parse_file_list, run_concat, AudioError, AudioResult, SourceResolver,
};
use vtts_models::{ConcatParams, ExportFormat, ReportEntry};

struct DirResolver {
    files: HashMap<String, PathBuf>,
}

impl SourceResolver for DirResolver {
    fn resolve(&self, name: &str) -> AudioResult<PathBuf> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| AudioError::FileNotFound(PathBuf::from(name)))
    }
}

fn write_tone(dir: &Path, name: &str, ms: u64, level: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(ms * 16) as usize {
        let t = i as f32 / 16_000.0;
        let sample = level * (t * 220.0 * std::f32::consts::TAU).sin();
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn resolver(dir: &Path, names: &[(&str, u64, f32)]) -> DirResolver {
    let files = names
        .iter()
        .map(|(name, ms, level)| {
            (name.to_string(), write_tone(dir, name, *ms, *level))
        })
        .collect();
    DirResolver { files }
}

/// intro (2.0 s) + "(1s)" + main (5.0 s) + natural pause (0.6 s) + outro (1.5 s)
/// must produce a 10.1 s output with a five-entry report in timeline order.
#[tokio::test]
async fn mixed_gaps_compose_in_timeline_order() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = resolver(
        dir.path(),
        &[
            ("intro.wav", 2000, 0.4),
            ("main.wav", 5000, 0.4),
            ("outro.wav", 1500, 0.4),
        ],
    );

    let files = vec![
        "intro.wav".to_string(),
        "(1s)".to_string(),
        "main.wav".to_string(),
        "outro.wav".to_string(),
    ];
    let segments = parse_file_list(&files).unwrap();

    let params = ConcatParams {
        pause_duration_ms: 600,
        pause_variation_ms: 0,
        normalize_levels: false,
        ..ConcatParams::default()
    };
    let output = run_concat(segments, &params, &resolver, &[]).await.unwrap();

    assert_eq!(output.segment_count, 3);
    assert!((output.total_duration_ms - 10_100.0).abs() < 2.0);

    let entries = &output.report.entries;
    assert_eq!(entries.len(), 5);
    assert!(matches!(&entries[0], ReportEntry::Segment { name, .. } if name == "intro.wav"));
    assert!(matches!(entries[1], ReportEntry::Silence { duration_ms: 1000 }));
    assert!(matches!(&entries[2], ReportEntry::Segment { name, .. } if name == "main.wav"));
    assert!(matches!(
        entries[3],
        ReportEntry::Pause {
            duration_ms: 600,
            base_ms: 600,
            ..
        }
    ));
    assert!(matches!(&entries[4], ReportEntry::Segment { name, .. } if name == "outro.wav"));

    // Entry durations always account for the full output.
    assert!((output.report.total_ms() - output.total_duration_ms).abs() < 2.0);
}

/// Explicit silence at a boundary suppresses crossfading there; only the
/// direct boundary loses its overlap.
#[tokio::test]
async fn crossfade_applies_only_at_direct_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = resolver(
        dir.path(),
        &[
            ("a.wav", 1000, 0.4),
            ("b.wav", 1000, 0.4),
            ("c.wav", 1000, 0.4),
        ],
    );

    let files = vec![
        "a.wav".to_string(),
        "b.wav".to_string(),
        "(0.5s)".to_string(),
        "c.wav".to_string(),
    ];
    let segments = parse_file_list(&files).unwrap();

    let params = ConcatParams {
        crossfade_ms: 200,
        normalize_levels: false,
        ..ConcatParams::default()
    };
    let output = run_concat(segments, &params, &resolver, &[]).await.unwrap();

    // 3.0 s of audio + 0.5 s silence - one 0.2 s overlap
    assert!((output.total_duration_ms - 3300.0).abs() < 2.0);
    assert!((output.report.total_ms() - output.total_duration_ms).abs() < 2.0);
}

/// Trimming applies per segment before composition and shows up in the
/// report's trim records.
#[tokio::test]
async fn trim_records_surface_in_the_report() {
    let dir = tempfile::tempdir().unwrap();

    // 500 ms leading silence then 1 s of tone
    let path = dir.path().join("padded.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..8_000 {
        writer.write_sample(0i16).unwrap();
    }
    for i in 0..16_000usize {
        let t = i as f32 / 16_000.0;
        let s = 0.4 * (t * 220.0 * std::f32::consts::TAU).sin();
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();

    let resolver = DirResolver {
        files: HashMap::from([("padded.wav".to_string(), path)]),
    };
    let segments = parse_file_list(&["padded.wav".to_string()]).unwrap();
    let params = ConcatParams {
        trim: true,
        normalize_levels: false,
        ..ConcatParams::default()
    };
    let output = run_concat(segments, &params, &resolver, &[]).await.unwrap();

    let ReportEntry::Segment { trim: Some(trim), .. } = &output.report.entries[0] else {
        panic!("expected a segment entry with a trim record");
    };
    assert!(trim.trimmed);
    assert!(trim.leading_removed_ms > 350.0);
    assert!(output.total_duration_ms < 1200.0);
    assert!(output.primary().filename.contains("_trim200"));
}

/// Multiple formats are either all produced or the request fails; WAV-only
/// requests never touch FFmpeg.
#[tokio::test]
async fn wav_only_export_produces_playable_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = resolver(dir.path(), &[("a.wav", 500, 0.4)]);

    let segments = parse_file_list(&["a.wav".to_string()]).unwrap();
    let params = ConcatParams {
        export_formats: vec![ExportFormat::Wav],
        ..ConcatParams::default()
    };
    let output = run_concat(segments, &params, &resolver, &[]).await.unwrap();

    let bytes = &output.primary().bytes;
    let reader = hound::WavReader::new(std::io::Cursor::new(bytes.clone())).unwrap();
    assert_eq!(reader.spec().sample_rate, 16_000);
    assert_eq!(reader.spec().channels, 1);
}
