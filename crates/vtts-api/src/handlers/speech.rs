//! TTS and voice-conversion handlers (engine proxies plus export).

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use validator::Validate;

use vtts_audio::{decode_file, encode_all, generate_stem, timestamp_stem, UploadScope};
use vtts_engine::{ConversionRequest, SynthesisRequest};
use vtts_models::{
    CompositionOutput, ExportFormat, ProcessingReport, ReportEntry, ResponseMode, TtsRequest,
    VoiceConvertParams,
};

use crate::error::{ApiError, ApiResult};
use crate::handlers::respond::{audio_response, store_outputs};
use crate::metrics;
use crate::state::AppState;

/// POST /api/tts — synthesize speech and export it.
pub async fn tts(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> ApiResult<Response> {
    request.validate()?;
    let voice_path = state.voices.audio_path(&request.voice).await?;

    let start = Instant::now();
    let wav = state
        .engine
        .synthesize(&SynthesisRequest {
            text: request.text.clone(),
            voice_path: voice_path.to_string_lossy().into_owned(),
            speed: request.speed,
            seed: request.seed,
        })
        .await?;
    metrics::record_engine_request("synthesize", start.elapsed().as_secs_f64());

    let stem = custom_or_generated(request.output_filename.as_deref(), "tts");
    export_engine_audio(
        &state,
        wav,
        &request.export_formats,
        request.response_mode,
        stem,
        "tts",
    )
    .await
}

/// POST /api/voice-convert — multipart source audio + target voice.
///
/// Expects a `request` part (JSON [`VoiceConvertParams`]) and one `file`
/// part carrying the source speech.
pub async fn voice_convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut params: Option<VoiceConvertParams> = None;
    let mut scope = UploadScope::new().map_err(ApiError::from)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("request") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("unreadable request part: {e}")))?;
                params = Some(
                    serde_json::from_slice(&bytes)
                        .map_err(|e| ApiError::bad_request(format!("invalid request JSON: {e}")))?,
                );
            }
            Some("file") | Some("files") => {
                let name = field.file_name().unwrap_or("source.wav").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("unreadable file part: {e}")))?;
                scope.persist(&name, &bytes).map_err(ApiError::from)?;
            }
            _ => {}
        }
    }

    let params = params.ok_or_else(|| ApiError::bad_request("missing 'request' multipart part"))?;
    params.validate()?;
    let source_path = scope
        .files()
        .first()
        .cloned()
        .ok_or_else(|| ApiError::bad_request("missing source audio file part"))?;
    let voice_path = state.voices.audio_path(&params.voice).await?;

    let start = Instant::now();
    let wav = state
        .engine
        .convert_voice(&ConversionRequest {
            source_path: source_path.to_string_lossy().into_owned(),
            voice_path: voice_path.to_string_lossy().into_owned(),
        })
        .await?;
    metrics::record_engine_request("convert", start.elapsed().as_secs_f64());
    drop(scope);

    let stem = custom_or_generated(params.output_filename.as_deref(), "vc");
    export_engine_audio(
        &state,
        wav,
        &params.export_formats,
        params.response_mode,
        stem,
        "converted",
    )
    .await
}

fn custom_or_generated(custom: Option<&str>, prefix: &str) -> String {
    match custom {
        // generate_stem sanitizes the custom stem and ignores the metadata
        Some(custom) => generate_stem(Some(custom), &Default::default()),
        None => timestamp_stem(prefix),
    }
}

/// Decode engine WAV bytes and run the exporter over them.
async fn export_engine_audio(
    state: &AppState,
    wav: Vec<u8>,
    formats: &[ExportFormat],
    mode: ResponseMode,
    stem: String,
    label: &str,
) -> ApiResult<Response> {
    // The engine replies with WAV; round-trip through the decoder so the
    // exporter sees a normalized mono buffer regardless of engine output.
    let mut scratch = UploadScope::new().map_err(ApiError::from)?;
    let path = scratch
        .persist("engine.wav", &wav)
        .map_err(ApiError::from)?;
    let label_owned = label.to_string();
    let buffer = tokio::task::spawn_blocking(move || decode_file(&path, &label_owned))
        .await
        .map_err(|e| ApiError::internal(format!("decode task panicked: {e}")))??;
    drop(scratch);

    let encoded = encode_all(&buffer, formats, &stem).await?;
    let total_duration_ms = buffer.duration_ms();

    match mode {
        ResponseMode::Stream => Ok(audio_response(&encoded[0], total_duration_ms)),
        ResponseMode::Url => {
            let files = store_outputs(state, &encoded).await?;
            Ok(Json(CompositionOutput {
                files,
                total_duration_ms,
                sample_rate: buffer.sample_rate,
                segment_count: 1,
                report: ProcessingReport {
                    entries: vec![ReportEntry::Segment {
                        name: label.to_string(),
                        duration_ms: total_duration_ms,
                        trim: None,
                    }],
                },
            })
            .into_response())
        }
    }
}
