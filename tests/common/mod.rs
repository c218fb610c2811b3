#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use rust_translate_backend::config::AppConfig;
use rust_translate_backend::services::storage::{MemoryStorage, StorageBackend};
use rust_translate_backend::services::translator::{Translator, TranslatorError};
use rust_translate_backend::{AppState, create_app};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

#[derive(Debug, Clone, Copy)]
pub enum StubOutcome {
    Succeed,
    QuotaExceeded,
    Unauthorized,
}

/// Stands in for DeepL: prefixes the input with `[target]` or fails on demand.
pub struct StubTranslator {
    outcome: StubOutcome,
    pub calls: Mutex<Vec<(Option<String>, String, String)>>,
}

impl StubTranslator {
    pub fn new(outcome: StubOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        source_lang: Option<&str>,
        target_lang: &str,
        display_name: &str,
    ) -> Result<(), TranslatorError> {
        self.calls.lock().unwrap().push((
            source_lang.map(str::to_string),
            target_lang.to_string(),
            display_name.to_string(),
        ));

        match self.outcome {
            StubOutcome::Succeed => {
                let mut data = format!("[{}] ", target_lang).into_bytes();
                data.extend(tokio::fs::read(input).await?);
                tokio::fs::write(output, data).await?;
                Ok(())
            }
            StubOutcome::QuotaExceeded => Err(TranslatorError::QuotaExceeded(
                "Quota for this billing period has been exceeded".to_string(),
            )),
            StubOutcome::Unauthorized => Err(TranslatorError::Unauthorized(
                "Authorization failure, check auth_key".to_string(),
            )),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub storage: Arc<MemoryStorage>,
    pub translator: Arc<StubTranslator>,
}

pub fn setup_app(outcome: StubOutcome) -> TestApp {
    setup_app_with(AppConfig::development(), outcome)
}

pub fn setup_app_with(config: AppConfig, outcome: StubOutcome) -> TestApp {
    let storage = Arc::new(MemoryStorage::new());
    let translator = Arc::new(StubTranslator::new(outcome));
    let backend: Arc<dyn StorageBackend> = storage.clone();
    let state = AppState::new(config, backend, translator.clone());

    TestApp {
        app: create_app(state),
        storage,
        translator,
    }
}

/// Builds a multipart body with one `file` part and any number of text parts.
pub fn multipart_body(file: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
