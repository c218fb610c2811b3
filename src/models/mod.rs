use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Characters left untouched when a storage key is placed in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const DOWNLOAD_ROUTE_PREFIX: &str = "/api/downloads";

/// Outcome of one successful orchestration. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub success: bool,
    pub message: String,
    pub download_url: String,
    pub filename: String,
    pub original_filename: String,
}

impl TranslationResult {
    pub fn completed(output_key: &str, original_filename: &str) -> Self {
        Self {
            success: true,
            message: "Document translated".to_string(),
            download_url: download_url(output_key),
            filename: output_key.to_string(),
            original_filename: original_filename.to_string(),
        }
    }
}

pub fn download_url(key: &str) -> String {
    format!(
        "{}/{}",
        DOWNLOAD_ROUTE_PREFIX,
        utf8_percent_encode(key, PATH_SEGMENT)
    )
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_key: String,
    pub original_filename: String,
}
