//! Shared stream/url response plumbing.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

use vtts_audio::EncodedOutput;
use vtts_models::OutputFile;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Build an inline audio response with a download filename.
pub fn audio_response(encoded: &EncodedOutput, total_duration_ms: f64) -> Response {
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoded.format.content_type());

    let disposition = format!(
        "inline; filename=\"{}\"",
        encoded.filename.replace('"', "")
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response = response.header(header::CONTENT_DISPOSITION, value);
    }
    if total_duration_ms > 0.0 {
        if let Ok(value) = HeaderValue::from_str(&format!("{:.1}", total_duration_ms)) {
            response = response.header("X-Audio-Duration-Ms", value);
        }
    }

    response
        .body(Body::from(encoded.bytes.clone()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Store every encoded format and describe each stored file.
pub async fn store_outputs(
    state: &AppState,
    encoded: &[EncodedOutput],
) -> ApiResult<Vec<OutputFile>> {
    let mut files = Vec::with_capacity(encoded.len());
    for output in encoded {
        let stored_name = state
            .outputs
            .save(&output.filename, &output.bytes)
            .await
            .map_err(ApiError::from)?;
        files.push(OutputFile {
            format: output.format,
            size_bytes: output.bytes.len() as u64,
            url: Some(format!("/api/outputs/{stored_name}")),
            filename: stored_name,
        });
    }
    Ok(files)
}
