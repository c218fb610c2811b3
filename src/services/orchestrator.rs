use crate::domain::Document;
use crate::models::TranslationResult;
use crate::services::storage::{FileArea, StorageBackend, StorageError};
use crate::services::translator::{Translator, TranslatorError, normalize_source_lang};
use crate::utils::content_type::mime_from_extension;
use bytes::Bytes;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("target_lang is required")]
    MissingTargetLanguage,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Translator(#[from] TranslatorError),
}

impl From<std::io::Error> for TranslationError {
    fn from(e: std::io::Error) -> Self {
        TranslationError::Storage(StorageError::Io(e))
    }
}

/// One translation job as handed over by the HTTP edge.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub document: Document,
    /// Caller value; `"auto"` asks for detection
    pub source_lang: Option<String>,
    pub target_lang: String,
}

/// Output names tried per request. Each retry moves the timestamp one millisecond on.
const MAX_OUTPUT_NAME_ATTEMPTS: i64 = 32;

/// The uploaded input as the translator reads it.
///
/// Backends with local paths hand theirs out directly; for the others the
/// bytes go through a temporary file that is removed on drop.
enum StagedInput {
    Direct(PathBuf),
    Temporary(NamedTempFile),
}

impl StagedInput {
    fn path(&self) -> &Path {
        match self {
            StagedInput::Direct(path) => path,
            StagedInput::Temporary(file) => file.path(),
        }
    }
}

/// Where the translator writes its result.
enum StagedOutput {
    /// Created empty in the download area before the translator runs, so no
    /// other request can be handed the same name.
    Reserved { path: PathBuf, name: String },
    /// Committed to the backend under a free name once translation succeeds.
    Temporary(NamedTempFile),
}

impl StagedOutput {
    fn path(&self) -> &Path {
        match self {
            StagedOutput::Reserved { path, .. } => path,
            StagedOutput::Temporary(file) => file.path(),
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs a document through stage → translate → cleanup → result.
///
/// The uploaded input is deleted exactly once per call, after the translation
/// attempt and before `execute` returns, whatever the outcome. Every call owns
/// a distinct output name, even when two calls share a document name and a
/// timestamp.
pub struct TranslationOrchestrator {
    storage: Arc<dyn StorageBackend>,
    translator: Arc<dyn Translator>,
    in_flight: AtomicUsize,
}

impl TranslationOrchestrator {
    pub fn new(storage: Arc<dyn StorageBackend>, translator: Arc<dyn Translator>) -> Self {
        Self {
            storage,
            translator,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Orchestrations currently executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn execute(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResult, TranslationError> {
        self.execute_at(request, Utc::now().timestamp_millis())
            .await
    }

    async fn execute_at(
        &self,
        request: TranslationRequest,
        timestamp: i64,
    ) -> Result<TranslationResult, TranslationError> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        let started = Instant::now();
        let document = &request.document;

        info!(
            "🌐 Translating '{}' ({} → {})",
            document.original_name(),
            request.source_lang.as_deref().unwrap_or("auto-detect"),
            request.target_lang
        );

        let outcome = self.translate_staged(&request, timestamp).await;
        self.release_input(document).await;

        match outcome {
            Ok(output_key) => {
                info!(
                    "✅ Translated '{}' into '{}' in {:?}",
                    document.original_name(),
                    output_key,
                    started.elapsed()
                );
                Ok(TranslationResult::completed(
                    &output_key,
                    document.original_name(),
                ))
            }
            Err(e) => {
                warn!(
                    "❌ Translation of '{}' failed after {:?}: {}",
                    document.original_name(),
                    started.elapsed(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn translate_staged(
        &self,
        request: &TranslationRequest,
        timestamp: i64,
    ) -> Result<String, TranslationError> {
        if request.target_lang.trim().is_empty() {
            return Err(TranslationError::MissingTargetLanguage);
        }
        let document = &request.document;
        let source_lang = normalize_source_lang(request.source_lang.as_deref());

        let input = self.stage_input(document).await?;
        let output = self.stage_output(document, timestamp).await?;

        let translated = self
            .translator
            .translate_document(
                input.path(),
                output.path(),
                source_lang,
                &request.target_lang,
                document.original_name(),
            )
            .await;

        let committed = match translated {
            Ok(()) => self.commit_output(&output, document, timestamp).await,
            Err(e) => Err(e.into()),
        };
        if committed.is_err() {
            self.discard_output(&output).await;
        }
        committed
    }

    async fn stage_input(&self, document: &Document) -> Result<StagedInput, TranslationError> {
        let key = document.temp_location();
        if let Some(path) = self.storage.resolve_local_path(FileArea::Upload, key) {
            return Ok(StagedInput::Direct(path));
        }

        let data = self.storage.get(FileArea::Upload, key).await?;
        let file = temp_file_for(document.extension())?;
        tokio::fs::write(file.path(), &data).await?;
        Ok(StagedInput::Temporary(file))
    }

    async fn stage_output(
        &self,
        document: &Document,
        timestamp: i64,
    ) -> Result<StagedOutput, TranslationError> {
        let first_name = document.output_filename(timestamp);
        if self
            .storage
            .resolve_local_path(FileArea::Download, &first_name)
            .is_none()
        {
            return Ok(StagedOutput::Temporary(temp_file_for(document.extension())?));
        }

        for attempt in 0..MAX_OUTPUT_NAME_ATTEMPTS {
            let name = document.output_filename(timestamp + attempt);
            let path = self
                .storage
                .resolve_local_path(FileArea::Download, &name)
                .ok_or_else(|| StorageError::InvalidKey(name.clone()))?;

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(StagedOutput::Reserved { path, name }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Output name {} is taken, trying the next one", name);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::Conflict(first_name).into())
    }

    async fn commit_output(
        &self,
        output: &StagedOutput,
        document: &Document,
        timestamp: i64,
    ) -> Result<String, TranslationError> {
        match output {
            StagedOutput::Reserved { path, name } => {
                if tokio::fs::metadata(path).await?.len() == 0 {
                    return Err(TranslatorError::Provider(
                        "translator reported success but wrote no output".to_string(),
                    )
                    .into());
                }
                Ok(name.clone())
            }
            StagedOutput::Temporary(file) => {
                let data = Bytes::from(tokio::fs::read(file.path()).await?);
                let first_name = document.output_filename(timestamp);

                for attempt in 0..MAX_OUTPUT_NAME_ATTEMPTS {
                    let name = document.output_filename(timestamp + attempt);
                    match self
                        .storage
                        .put_named(
                            FileArea::Download,
                            &name,
                            data.clone(),
                            &name,
                            &mime_from_extension(&name),
                        )
                        .await
                    {
                        Ok(key) => return Ok(key),
                        Err(StorageError::Conflict(_)) => {
                            debug!("Output name {} is taken, trying the next one", name);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }

                Err(StorageError::Conflict(first_name).into())
            }
        }
    }

    /// Drops the reserved output of a failed attempt. Temporary files clean up on drop.
    async fn discard_output(&self, output: &StagedOutput) {
        let StagedOutput::Reserved { name, .. } = output else {
            return;
        };
        if let Err(e) = self.storage.delete(FileArea::Download, name).await {
            warn!("Failed to discard partial output {}: {}", name, e);
        }
    }

    async fn release_input(&self, document: &Document) {
        let key = document.temp_location();
        match self.storage.delete(FileArea::Upload, key).await {
            Ok(()) => info!("🧹 Deleted uploaded file: {}", key),
            Err(e) => error!("Failed to delete uploaded file {}: {}", key, e),
        }
    }
}

fn temp_file_for(extension: &str) -> std::io::Result<NamedTempFile> {
    let suffix = if extension.is_empty() {
        String::new()
    } else {
        format!(".{}", extension)
    };
    tempfile::Builder::new()
        .prefix("translate-")
        .suffix(&suffix)
        .tempfile()
}
