use super::{Translator, TranslatorError};
use crate::config::TranslatorConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const FREE_API_URL: &str = "https://api-free.deepl.com/";
const PRO_API_URL: &str = "https://api.deepl.com/";

/// DeepL answers 456 when the account's character quota is used up.
const QUOTA_EXCEEDED: u16 = 456;

/// Upper bound for a single wait between status checks.
const MAX_POLL_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct DocumentHandle {
    document_id: String,
    document_key: String,
}

#[derive(Debug, Deserialize)]
struct DocumentStatus {
    status: String,
    #[serde(default)]
    seconds_remaining: Option<u64>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// DeepL document translation over the v2 REST API.
///
/// A call uploads the document, polls its status until DeepL reports `done`
/// and writes the result to the output path. Polling is internal to this
/// gateway; nothing about it is visible to the caller.
pub struct DeeplTranslator {
    client: Client,
    api_key: String,
    base_url: Url,
    poll_interval: Duration,
    timeout: Duration,
}

impl DeeplTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslatorError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(TranslatorError::MissingCredential)?
            .to_string();

        let raw_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| default_api_url(&api_key).to_string());
        let mut base_url = Url::parse(&raw_url).map_err(|e| {
            TranslatorError::Configuration(format!("invalid DeepL API URL '{}': {}", raw_url, e))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TranslatorError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            poll_interval: config.poll_interval,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TranslatorError> {
        self.base_url
            .join(path)
            .map_err(|e| TranslatorError::Configuration(e.to_string()))
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    async fn upload(
        &self,
        input: &Path,
        source_lang: Option<&str>,
        target_lang: &str,
        display_name: &str,
    ) -> Result<DocumentHandle, TranslatorError> {
        let data = tokio::fs::read(input).await?;
        let size = data.len();

        let mut form = Form::new()
            .text("target_lang", target_lang.to_string())
            .part("file", Part::bytes(data).file_name(display_name.to_string()));
        if let Some(source_lang) = source_lang {
            form = form.text("source_lang", source_lang.to_string());
        }

        let response = self
            .client
            .post(self.endpoint("v2/document")?)
            .header(AUTHORIZATION, self.auth_header())
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        let handle: DocumentHandle = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(request_error)?;

        info!(
            "📤 Uploaded '{}' ({} bytes) to DeepL as document {}",
            display_name, size, handle.document_id
        );
        Ok(handle)
    }

    async fn status(&self, handle: &DocumentHandle) -> Result<DocumentStatus, TranslatorError> {
        let response = self
            .client
            .post(self.endpoint(&format!("v2/document/{}", handle.document_id))?)
            .header(AUTHORIZATION, self.auth_header())
            .form(&[("document_key", handle.document_key.as_str())])
            .send()
            .await
            .map_err(request_error)?;

        ensure_success(response)
            .await?
            .json()
            .await
            .map_err(request_error)
    }

    async fn wait_until_done(&self, handle: &DocumentHandle) -> Result<(), TranslatorError> {
        loop {
            let status = self.status(handle).await?;
            match status.status.as_str() {
                "done" => return Ok(()),
                "error" => {
                    let message = status
                        .error_message
                        .unwrap_or_else(|| "unknown error".to_string());
                    warn!(
                        "DeepL reported an error for document {}: {}",
                        handle.document_id, message
                    );
                    if message.to_lowercase().contains("quota") {
                        return Err(TranslatorError::QuotaExceeded(message));
                    }
                    return Err(TranslatorError::Provider(message));
                }
                other => {
                    let delay = self.next_delay(status.seconds_remaining);
                    debug!(
                        "DeepL document {} is {}; checking again in {:?}",
                        handle.document_id, other, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn next_delay(&self, seconds_remaining: Option<u64>) -> Duration {
        seconds_remaining
            .map(Duration::from_secs)
            .filter(|hint| *hint > self.poll_interval)
            .map(|hint| hint.min(MAX_POLL_DELAY))
            .unwrap_or(self.poll_interval)
    }

    async fn download(&self, handle: &DocumentHandle, output: &Path) -> Result<(), TranslatorError> {
        let response = self
            .client
            .post(self.endpoint(&format!("v2/document/{}/result", handle.document_id))?)
            .header(AUTHORIZATION, self.auth_header())
            .form(&[("document_key", handle.document_key.as_str())])
            .send()
            .await
            .map_err(request_error)?;

        let data = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(request_error)?;
        tokio::fs::write(output, &data).await?;

        info!(
            "📥 Downloaded DeepL document {} ({} bytes)",
            handle.document_id,
            data.len()
        );
        Ok(())
    }
}

#[async_trait]
impl Translator for DeeplTranslator {
    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        source_lang: Option<&str>,
        target_lang: &str,
        display_name: &str,
    ) -> Result<(), TranslatorError> {
        let job = async {
            let handle = self
                .upload(input, source_lang, target_lang, display_name)
                .await?;
            self.wait_until_done(&handle).await?;
            self.download(&handle, output).await
        };

        tokio::time::timeout(self.timeout, job)
            .await
            .map_err(|_| {
                TranslatorError::Provider(format!(
                    "translation did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })?
    }
}

/// Free-tier keys carry a `:fx` suffix and use a separate host.
pub fn default_api_url(api_key: &str) -> &'static str {
    if api_key.ends_with(":fx") {
        FREE_API_URL
    } else {
        PRO_API_URL
    }
}

fn request_error(e: reqwest::Error) -> TranslatorError {
    TranslatorError::Provider(format!("DeepL request failed: {}", e))
}

async fn ensure_success(response: Response) -> Result<Response, TranslatorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(body);

    Err(classify_status(status, message))
}

fn classify_status(status: StatusCode, message: String) -> TranslatorError {
    match status.as_u16() {
        QUOTA_EXCEEDED | 429 => TranslatorError::QuotaExceeded(message),
        401 | 403 => TranslatorError::Unauthorized(message),
        413 => TranslatorError::PayloadTooLarge(message),
        _ => TranslatorError::Provider(format!("DeepL returned {}: {}", status, message)),
    }
}
