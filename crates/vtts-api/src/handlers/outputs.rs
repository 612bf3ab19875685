//! Output file listing, download and deletion.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vtts_audio::EncodedOutput;
use vtts_models::ExportFormat;

use crate::error::{ApiError, ApiResult};
use crate::handlers::respond::audio_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    50
}

#[derive(Serialize)]
pub struct OutputListing {
    pub files: Vec<OutputEntry>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Serialize)]
pub struct OutputEntry {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
    pub url: String,
}

/// GET /api/outputs — paginated listing, newest first.
pub async fn list_outputs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<OutputListing>> {
    let page_size = query.page_size.clamp(1, 500);
    let page = state.outputs.list(query.page, page_size).await?;

    Ok(Json(OutputListing {
        files: page
            .files
            .into_iter()
            .map(|f| OutputEntry {
                url: format!("/api/outputs/{}", f.name),
                name: f.name,
                size_bytes: f.size_bytes,
                modified: f.modified,
            })
            .collect(),
        total: page.total,
        page: page.page,
        page_size: page.per_page,
    }))
}

/// GET /api/outputs/:filename — download one stored output.
pub async fn download_output(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = state.outputs.resolve(&filename)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal(format!("failed to read {filename}: {e}")))?;

    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|e| ExportFormat::from_str(e).ok());

    match format {
        Some(format) => Ok(audio_response(
            &EncodedOutput {
                format,
                filename,
                bytes,
            },
            0.0,
        )),
        None => Ok((
            StatusCode::OK,
            [("Content-Type", "application/octet-stream")],
            bytes,
        )
            .into_response()),
    }
}

/// DELETE /api/outputs/:filename.
pub async fn delete_output(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<StatusCode> {
    state.outputs.delete(&filename).await?;
    Ok(StatusCode::NO_CONTENT)
}
