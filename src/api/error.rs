use crate::services::orchestrator::TranslationError;
use crate::services::storage::StorageError;
use crate::services::translator::TranslatorError;
use crate::utils::validation::ValidationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuth(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ProviderAuth(_) => StatusCode::UNAUTHORIZED,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "VALIDATION_ERROR",
            AppError::InvalidKey(_) => "INVALID_KEY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::QuotaExceeded(_) => "PROVIDER_QUOTA_EXCEEDED",
            AppError::ProviderAuth(_) => "PROVIDER_AUTH_ERROR",
            AppError::Provider(_) => "PROVIDER_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                "Storage operation failed".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Provider(msg) => {
                tracing::warn!("Provider error: {}", msg);
                msg
            }
            AppError::BadRequest(msg)
            | AppError::InvalidKey(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::QuotaExceeded(msg)
            | AppError::ProviderAuth(msg) => msg,
        };

        let body = Json(json!({
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        match e.code {
            "FILE_TOO_LARGE" => AppError::PayloadTooLarge(e.message),
            _ => AppError::BadRequest(e.message),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(key) => AppError::NotFound(format!("File not found: {}", key)),
            StorageError::InvalidKey(key) => {
                AppError::InvalidKey(format!("Invalid file key: {}", key))
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<TranslatorError> for AppError {
    fn from(e: TranslatorError) -> Self {
        match e {
            TranslatorError::QuotaExceeded(msg) => AppError::QuotaExceeded(msg),
            TranslatorError::Unauthorized(msg) => AppError::ProviderAuth(msg),
            TranslatorError::PayloadTooLarge(msg) => AppError::PayloadTooLarge(msg),
            TranslatorError::Provider(msg) => AppError::Provider(msg),
            other @ (TranslatorError::MissingCredential
            | TranslatorError::Configuration(_)
            | TranslatorError::Io(_)) => AppError::Internal(other.to_string()),
        }
    }
}

impl From<TranslationError> for AppError {
    fn from(e: TranslationError) -> Self {
        match e {
            TranslationError::MissingTargetLanguage => {
                AppError::BadRequest("target_lang is required".to_string())
            }
            TranslationError::Storage(e) => e.into(),
            TranslationError::Translator(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_provider_errors_map_to_distinct_statuses() {
        let cases = [
            (
                TranslatorError::QuotaExceeded("q".into()),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                TranslatorError::Unauthorized("a".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                TranslatorError::PayloadTooLarge("s".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (TranslatorError::Provider("p".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_storage_errors() {
        assert_eq!(
            AppError::from(StorageError::NotFound("k".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(StorageError::InvalidKey("../k".into())).code(),
            "INVALID_KEY"
        );
        assert_eq!(
            AppError::from(StorageError::Backend("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_oversized_upload_is_413() {
        let err = ValidationError::new("FILE_TOO_LARGE", "too big");
        assert_eq!(AppError::from(err).status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_body_hides_storage_details() {
        let (status, body) = render(AppError::Storage("disk /var/x full".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "STORAGE_ERROR");
        assert_eq!(body["error"], "Storage operation failed");
    }

    #[tokio::test]
    async fn test_body_carries_code_and_message() {
        let (status, body) = render(TranslationError::MissingTargetLanguage.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "target_lang is required");
    }
}
