use crate::api::error::AppError;
use crate::utils::content_type::detect_mime_type;
use crate::utils::validation::{non_blank, sanitize_filename, validate_file_size};
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::Bytes;

/// The `file` part of an upload, already sanitized and typed.
pub struct UploadedFile {
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
}

#[derive(Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Reads every part of the form into memory. Unknown parts are skipped.
pub async fn read_upload_form(
    mut multipart: Multipart,
    max_file_size: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                // Output names are derived from the upload name
                let original_filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::BadRequest("File part has no filename".to_string()))?;
                let declared_type = field.content_type().map(|s| s.to_string());
                let filename = sanitize_filename(&original_filename)?;

                let data = field.bytes().await.map_err(multipart_error)?;
                if data.is_empty() {
                    return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
                }
                validate_file_size(data.len(), max_file_size)?;

                let mime_type = detect_mime_type(declared_type.as_deref(), &filename, &data);
                form.file = Some(UploadedFile {
                    filename,
                    mime_type,
                    data,
                });
            }
            "source_lang" => {
                form.source_lang = non_blank(Some(field.text().await.map_err(multipart_error)?));
            }
            "target_lang" => {
                form.target_lang = non_blank(Some(field.text().await.map_err(multipart_error)?));
            }
            _ => {}
        }
    }

    Ok(form)
}
