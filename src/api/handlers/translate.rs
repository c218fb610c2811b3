use super::form::read_upload_form;
use crate::AppState;
use crate::api::error::AppError;
use crate::domain::Document;
use crate::models::TranslationResult;
use crate::services::orchestrator::TranslationRequest;
use crate::services::storage::FileArea;
use crate::utils::validation::{non_blank, validate_language_code};
use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

/// Body of `POST /api/files/{key}/translate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TranslateStoredRequest {
    /// Source language code, or `auto` / absent to detect it
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

fn validate_languages(
    source_lang: Option<String>,
    target_lang: Option<String>,
) -> Result<(Option<String>, String), AppError> {
    let target_lang = non_blank(target_lang)
        .ok_or_else(|| AppError::BadRequest("target_lang is required".to_string()))?;
    validate_language_code("target_lang", &target_lang)?;

    let source_lang = non_blank(source_lang);
    if let Some(source) = &source_lang {
        validate_language_code("source_lang", source)?;
    }
    Ok((source_lang, target_lang))
}

/// Hands the job to its own task so a dropped connection cannot interrupt cleanup.
async fn run_translation(
    state: &AppState,
    request: TranslationRequest,
) -> Result<TranslationResult, AppError> {
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move { orchestrator.execute(request).await })
        .await
        .map_err(|e| AppError::Internal(format!("translation task failed: {}", e)))?
        .map_err(AppError::from)
}

#[utoipa::path(
    post,
    path = "/api/translate",
    request_body(content = Multipart, description = "Fields: file, target_lang, optional source_lang"),
    responses(
        (status = 200, description = "Document translated", body = TranslationResult),
        (status = 400, description = "Missing file or invalid language"),
        (status = 401, description = "Provider rejected the credentials"),
        (status = 413, description = "File too large"),
        (status = 429, description = "Provider quota exceeded"),
        (status = 502, description = "Provider failure")
    ),
    tag = "translation"
)]
pub async fn translate_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TranslationResult>, AppError> {
    let form = read_upload_form(multipart, state.config.max_file_size).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let (source_lang, target_lang) = validate_languages(form.source_lang, form.target_lang)?;

    let key = state
        .storage
        .put(FileArea::Upload, file.data, &file.filename, &file.mime_type)
        .await?;
    info!("📤 Uploaded '{}' as {}", file.filename, key);

    let result = run_translation(
        &state,
        TranslationRequest {
            document: Document::new(file.filename, key),
            source_lang,
            target_lang,
        },
    )
    .await?;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/files/{key}/translate",
    params(("key" = String, Path, description = "Key returned by the upload endpoint")),
    request_body = TranslateStoredRequest,
    responses(
        (status = 200, description = "Document translated", body = TranslationResult),
        (status = 400, description = "Invalid language or key"),
        (status = 404, description = "Unknown upload key"),
        (status = 429, description = "Provider quota exceeded"),
        (status = 502, description = "Provider failure")
    ),
    tag = "translation"
)]
pub async fn translate_stored(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<TranslateStoredRequest>,
) -> Result<Json<TranslationResult>, AppError> {
    let (source_lang, target_lang) = validate_languages(req.source_lang, req.target_lang)?;
    let metadata = state.storage.get_metadata(FileArea::Upload, &key).await?;

    let result = run_translation(
        &state,
        TranslationRequest {
            document: Document::new(metadata.display_name, key),
            source_lang,
            target_lang,
        },
    )
    .await?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_required() {
        let err = validate_languages(Some("EN".into()), Some("  ".into())).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_blank_source_means_absent() {
        let (source, target) = validate_languages(Some("".into()), Some("DE".into())).unwrap();
        assert_eq!(source, None);
        assert_eq!(target, "DE");
    }

    #[test]
    fn test_auto_source_passes_through() {
        let (source, _) = validate_languages(Some("auto".into()), Some("pt-BR".into())).unwrap();
        assert_eq!(source.as_deref(), Some("auto"));
    }

    #[test]
    fn test_malformed_language_rejected() {
        assert!(validate_languages(None, Some("en/../x".into())).is_err());
    }
}
