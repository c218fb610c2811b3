use crate::AppState;
use crate::api::error::AppError;
use crate::services::storage::FileArea;
use crate::utils::content_type::attachment_disposition;
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

#[utoipa::path(
    get,
    path = "/api/downloads/{filename}",
    params(("filename" = String, Path, description = "Output name from a translation result")),
    responses(
        (status = 200, description = "Translated document bytes"),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "Unknown or already downloaded file")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let metadata = state
        .storage
        .get_metadata(FileArea::Download, &filename)
        .await?;
    let data = state.storage.get(FileArea::Download, &filename).await?;

    if state.config.delete_after_download {
        match state.storage.delete(FileArea::Download, &filename).await {
            Ok(()) => info!("🧹 Deleted downloaded file: {}", filename),
            Err(e) => warn!("Failed to delete downloaded file {}: {}", filename, e),
        }
    }

    Ok((
        [
            (header::CONTENT_TYPE, metadata.mime_type),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&metadata.display_name),
            ),
            (header::CONTENT_LENGTH, data.len().to_string()),
        ],
        Body::from(data),
    )
        .into_response())
}
