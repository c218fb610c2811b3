pub mod deepl;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub use deepl::DeeplTranslator;

/// Sentinel a caller sends when the source language should be detected.
pub const AUTO_DETECT: &str = "auto";

/// Failures a translation provider can report. Each maps to its own caller-facing status.
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("Translation quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Translation provider rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("Document exceeds the provider size limit: {0}")]
    PayloadTooLarge(String),

    #[error("Translation failed: {0}")]
    Provider(String),

    #[error("Translator API key is not configured")]
    MissingCredential,

    #[error("Translator configuration error: {0}")]
    Configuration(String),

    #[error("Translator I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wraps one external document translation capability.
///
/// Reads the document at `input` and writes the translated document to
/// `output`. `source_lang == None` asks the provider to detect the language.
/// Implementations never retry; each call is at most one provider job.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        source_lang: Option<&str>,
        target_lang: &str,
        display_name: &str,
    ) -> Result<(), TranslatorError>;
}

/// Maps the caller-facing `"auto"` sentinel to `None`; everything else passes through.
pub fn normalize_source_lang(source_lang: Option<&str>) -> Option<&str> {
    source_lang.filter(|lang| *lang != AUTO_DETECT)
}
