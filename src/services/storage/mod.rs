pub mod filesystem;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

pub use filesystem::FilesystemStorage;
pub use memory::MemoryStorage;
pub use s3::S3Storage;

/// Suffix reserved for metadata sidecars; never accepted as a key.
pub const SIDECAR_SUFFIX: &str = ".meta.json";

/// The two places a backend keeps bytes: staged uploads and translated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileArea {
    Upload,
    Download,
}

impl FileArea {
    pub fn prefix(self) -> &'static str {
        match self {
            FileArea::Upload => "uploads",
            FileArea::Download => "downloads",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileMetadata {
    pub mime_type: String,
    pub display_name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Key already exists: {0}")]
    Conflict(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt metadata sidecar: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable byte storage keyed by opaque identifiers.
///
/// Implementations must tolerate concurrent calls on distinct keys and treat
/// `delete` as idempotent. Callers never learn which variant is active.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Stores a payload under a freshly generated key and returns the key.
    async fn put(
        &self,
        area: FileArea,
        data: Bytes,
        display_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError>;

    /// Stores a payload under `name`, which must be a valid key.
    async fn put_named(
        &self,
        area: FileArea,
        name: &str,
        data: Bytes,
        display_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError>;

    async fn get(&self, area: FileArea, key: &str) -> Result<Bytes, StorageError>;

    async fn get_metadata(&self, area: FileArea, key: &str)
    -> Result<StoredFileMetadata, StorageError>;

    /// Removes the payload and its metadata. Missing targets are not an error.
    async fn delete(&self, area: FileArea, key: &str) -> Result<(), StorageError>;

    /// Maps a logical name to an on-disk path without touching the disk.
    ///
    /// `None` when the backend keeps no local files or `name` is not a valid key.
    fn resolve_local_path(&self, area: FileArea, name: &str) -> Option<PathBuf>;

    async fn health_check(&self) -> bool {
        true
    }
}

/// Builds a new unique key, keeping the display name's extension.
pub fn generate_key(display_name: &str) -> String {
    let ext: String = display_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(16)
        .collect::<String>()
        .to_lowercase();

    if ext.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        format!("{}.{}", Uuid::new_v4(), ext)
    }
}

/// A key is a single, non-reserved path component.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0'])
        || key.ends_with(SIDECAR_SUFFIX);

    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_key_keeps_extension() {
        let key = generate_key("Quarterly Report.PDF");
        assert!(key.ends_with(".pdf"));
        assert_eq!(key.len(), 36 + 4);
    }

    #[test]
    fn test_generate_key_without_extension() {
        let key = generate_key("README");
        assert!(Uuid::parse_str(&key).is_ok());
    }

    #[test]
    fn test_generated_keys_are_unique() {
        let keys: HashSet<String> = (0..1000).map(|_| generate_key("a.docx")).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("translated_report_1.pdf").is_ok());
        assert!(validate_key("my report.pdf").is_ok());

        for bad in ["", ".", "..", "../etc/passwd", "a/b", "a\\b", "x.pdf.meta.json"] {
            assert!(
                matches!(validate_key(bad), Err(StorageError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
