use super::form::read_upload_form;
use crate::AppState;
use crate::api::error::AppError;
use crate::models::UploadResponse;
use crate::services::storage::FileArea;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = Multipart, description = "File upload"),
    responses(
        (status = 201, description = "File stored for a later translation", body = UploadResponse),
        (status = 400, description = "No file provided"),
        (status = 413, description = "File too large")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let form = read_upload_form(multipart, state.config.max_file_size).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let file_key = state
        .storage
        .put(FileArea::Upload, file.data, &file.filename, &file.mime_type)
        .await?;
    info!("📤 Uploaded '{}' as {}", file.filename, file_key);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_key,
            original_filename: file.filename,
        }),
    ))
}
