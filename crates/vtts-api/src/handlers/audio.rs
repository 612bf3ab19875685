//! Concatenation and trimming handlers.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use vtts_audio::{
    parse_file_list, parse_segment_specs, run_concat, run_trim, PipelineOutput, UploadScope,
};
use vtts_models::{
    CompositionOutput, ConcatParams, ConcatRequest, MixedConcatRequest, ResponseMode,
    TrimRequest, TrimResult,
};

use crate::error::{ApiError, ApiResult};
use crate::handlers::respond::{audio_response, store_outputs};
use crate::metrics;
use crate::state::AppState;

/// POST /api/audio/concatenate — server-file segments with silence notation.
pub async fn concatenate(
    State(state): State<AppState>,
    Json(request): Json<ConcatRequest>,
) -> ApiResult<Response> {
    request.validate()?;
    let segments = parse_file_list(&request.files)?;

    let start = Instant::now();
    let output = run_concat(segments, &request.params, &state.resolver(), &[]).await?;
    metrics::record_composition(
        output.segment_count,
        output.total_duration_ms / 1000.0,
        start.elapsed().as_secs_f64(),
    );

    respond_composition(&state, output, &request.params).await
}

/// POST /api/audio/concatenate/upload — multipart mixed-source request.
///
/// Expects a `request` part (JSON [`MixedConcatRequest`]) and any number of
/// `files` parts; `upload` segments index into the file parts in order.
pub async fn concatenate_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut request: Option<MixedConcatRequest> = None;
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
                request = Some(
                    serde_json::from_slice(&bytes)
                        .map_err(|e| ApiError::bad_request(format!("invalid request JSON: {e}")))?,
                );
            }
            Some("files") | Some("file") => {
                let name = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("unreadable file part: {e}")))?;
                scope.persist(&name, &bytes).map_err(ApiError::from)?;
            }
            other => {
                info!(part = ?other, "ignoring unknown multipart part");
            }
        }
    }

    let request =
        request.ok_or_else(|| ApiError::bad_request("missing 'request' multipart part"))?;
    request.validate()?;
    let segments = parse_segment_specs(&request.segments, scope.len())?;

    let start = Instant::now();
    let uploads = scope.files().to_vec();
    let output = run_concat(segments, &request.params, &state.resolver(), &uploads).await?;
    metrics::record_composition(
        output.segment_count,
        output.total_duration_ms / 1000.0,
        start.elapsed().as_secs_f64(),
    );
    // scope dropped here; uploaded temp files are gone on every path
    drop(scope);

    respond_composition(&state, output, &request.params).await
}

#[derive(Serialize)]
struct TrimResponse {
    result: TrimResult,
    files: Vec<vtts_models::OutputFile>,
    sample_rate: u32,
}

/// POST /api/audio/trim — trim one stored file's edges.
pub async fn trim(
    State(state): State<AppState>,
    Json(request): Json<TrimRequest>,
) -> ApiResult<Response> {
    request.validate()?;

    let output = run_trim(
        &request.source,
        request.trim_threshold_ms,
        &request.export_formats,
        request.output_filename.as_deref(),
        &state.resolver(),
    )
    .await?;

    match request.response_mode {
        ResponseMode::Stream => Ok(audio_response(
            &output.encoded[0],
            output.result.trimmed_ms,
        )),
        ResponseMode::Url => {
            let files = store_outputs(&state, &output.encoded).await?;
            Ok(Json(TrimResponse {
                result: output.result,
                files,
                sample_rate: output.sample_rate,
            })
            .into_response())
        }
    }
}

async fn respond_composition(
    state: &AppState,
    output: PipelineOutput,
    params: &ConcatParams,
) -> ApiResult<Response> {
    match params.response_mode {
        ResponseMode::Stream => Ok(audio_response(output.primary(), output.total_duration_ms)),
        ResponseMode::Url => {
            let files = store_outputs(state, &output.encoded).await?;
            Ok(Json(CompositionOutput {
                files,
                total_duration_ms: output.total_duration_ms,
                sample_rate: output.sample_rate,
                segment_count: output.segment_count,
                report: output.report,
            })
            .into_response())
        }
    }
}
