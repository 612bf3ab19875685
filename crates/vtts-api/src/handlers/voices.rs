//! Voice reference management.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use vtts_models::VoiceInfo;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/voices — list registered voices.
pub async fn list_voices(State(state): State<AppState>) -> ApiResult<Json<Vec<VoiceInfo>>> {
    Ok(Json(state.voices.list().await?))
}

/// GET /api/voices/:name.
pub async fn get_voice(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<VoiceInfo>> {
    Ok(Json(state.voices.get(&name).await?))
}

/// POST /api/voices — multipart: `name`, optional `description`/`language`,
/// and a `file` part with the reference audio.
pub async fn create_voice(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<VoiceInfo>)> {
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut language: Option<String> = None;
    let mut audio: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let read_text = |e| ApiError::bad_request(format!("unreadable multipart part: {e}"));
        match field.name() {
            Some("name") => name = Some(field.text().await.map_err(read_text)?),
            Some("description") => description = Some(field.text().await.map_err(read_text)?),
            Some("language") => language = Some(field.text().await.map_err(read_text)?),
            Some("file") => {
                let filename = field.file_name().unwrap_or("reference.wav").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("unreadable file part: {e}")))?;
                audio = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ApiError::bad_request("missing 'name' part"))?;
    let (filename, bytes) =
        audio.ok_or_else(|| ApiError::bad_request("missing reference audio 'file' part"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("reference audio is empty"));
    }

    let info = state
        .voices
        .create(&name, &filename, &bytes, description, language)
        .await?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// DELETE /api/voices/:name.
pub async fn delete_voice(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    state.voices.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
