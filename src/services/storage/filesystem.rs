use super::{
    FileArea, SIDECAR_SUFFIX, StorageBackend, StorageError, StoredFileMetadata, generate_key,
    validate_key,
};
use crate::utils::content_type::mime_from_extension;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Stores uploads and translated artifacts in two local directories.
///
/// Display name and MIME type live in a `{key}.meta.json` sidecar next to the
/// payload. Files written straight to disk by the translator have no sidecar;
/// their metadata is derived from the key.
pub struct FilesystemStorage {
    upload_dir: PathBuf,
    download_dir: PathBuf,
}

impl FilesystemStorage {
    /// Opens the backend, creating both directories if they do not exist yet.
    pub async fn open(
        upload_dir: impl Into<PathBuf>,
        download_dir: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        let upload_dir = upload_dir.into();
        let download_dir = download_dir.into();

        for dir in [&upload_dir, &download_dir] {
            if fs::try_exists(dir).await? {
                continue;
            }
            fs::create_dir_all(dir).await?;
            info!("📁 Created storage directory: {}", dir.display());
        }

        Ok(Self {
            upload_dir,
            download_dir,
        })
    }

    fn dir(&self, area: FileArea) -> &Path {
        match area {
            FileArea::Upload => &self.upload_dir,
            FileArea::Download => &self.download_dir,
        }
    }

    fn path_for(&self, area: FileArea, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir(area).join(key))
    }

    fn sidecar_for(path: &Path) -> PathBuf {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(SIDECAR_SUFFIX);
        PathBuf::from(sidecar)
    }

    async fn write_new(
        &self,
        path: &Path,
        key: &str,
        data: &[u8],
        metadata: &StoredFileMetadata,
    ) -> Result<(), StorageError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::Conflict(key.to_string()),
                _ => StorageError::Io(e),
            })?;

        let sidecar = Self::sidecar_for(path);
        let written: Result<(), StorageError> = async {
            file.write_all(data).await?;
            file.flush().await?;
            fs::write(&sidecar, serde_json::to_vec(metadata)?).await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            // The key was never handed out, so nothing else will remove it
            for leftover in [path, sidecar.as_path()] {
                if let Err(cleanup) = remove_if_present(leftover).await {
                    warn!("Failed to remove partial write {}: {}", leftover.display(), cleanup);
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

async fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl StorageBackend for FilesystemStorage {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn put(
        &self,
        area: FileArea,
        data: Bytes,
        display_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError> {
        let key = generate_key(display_name);
        self.put_named(area, &key, data, display_name, mime_type)
            .await
    }

    async fn put_named(
        &self,
        area: FileArea,
        name: &str,
        data: Bytes,
        display_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.path_for(area, name)?;
        let metadata = StoredFileMetadata {
            mime_type: mime_type.to_string(),
            display_name: display_name.to_string(),
            size: data.len() as u64,
        };

        self.write_new(&path, name, &data, &metadata).await?;
        debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(name.to_string())
    }

    async fn get(&self, area: FileArea, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(area, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_metadata(
        &self,
        area: FileArea,
        key: &str,
    ) -> Result<StoredFileMetadata, StorageError> {
        let path = self.path_for(area, key)?;
        let size = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Err(StorageError::NotFound(key.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        match fs::read(Self::sidecar_for(&path)).await {
            Ok(raw) => {
                let mut metadata: StoredFileMetadata = serde_json::from_slice(&raw)?;
                metadata.size = size;
                Ok(metadata)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoredFileMetadata {
                mime_type: mime_from_extension(key),
                display_name: key.to_string(),
                size,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, area: FileArea, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(area, key)?;
        remove_if_present(&path).await?;
        remove_if_present(&Self::sidecar_for(&path)).await
    }

    fn resolve_local_path(&self, area: FileArea, name: &str) -> Option<PathBuf> {
        self.path_for(area, name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> (tempfile::TempDir, FilesystemStorage) {
        let root = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::open(root.path().join("uploads"), root.path().join("downloads"))
            .await
            .unwrap();
        (root, storage)
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_payload_behind() {
        let (root, storage) = open_temp().await;
        // A directory where the sidecar belongs makes the metadata write fail
        std::fs::create_dir(root.path().join("uploads").join("report.pdf.meta.json")).unwrap();

        let result = storage
            .put_named(
                FileArea::Upload,
                "report.pdf",
                Bytes::from_static(b"%PDF"),
                "report.pdf",
                "application/pdf",
            )
            .await;

        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(!root.path().join("uploads").join("report.pdf").exists());
    }

    #[tokio::test]
    async fn test_open_creates_directories() {
        let (root, _storage) = open_temp().await;
        assert!(root.path().join("uploads").is_dir());
        assert!(root.path().join("downloads").is_dir());
    }

    #[tokio::test]
    async fn test_put_get_and_metadata() {
        let (_root, storage) = open_temp().await;
        let key = storage
            .put(
                FileArea::Upload,
                Bytes::from_static(b"hello"),
                "greeting.txt",
                "text/plain",
            )
            .await
            .unwrap();

        assert!(key.ends_with(".txt"));
        assert_eq!(storage.get(FileArea::Upload, &key).await.unwrap(), "hello");

        let meta = storage.get_metadata(FileArea::Upload, &key).await.unwrap();
        assert_eq!(meta.display_name, "greeting.txt");
        assert_eq!(meta.mime_type, "text/plain");
        assert_eq!(meta.size, 5);

        // Areas are separate namespaces
        assert!(matches!(
            storage.get(FileArea::Download, &key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_metadata_derived_without_sidecar() {
        let (root, storage) = open_temp().await;
        std::fs::write(root.path().join("downloads/translated_a_1.pdf"), b"%PDF").unwrap();

        let meta = storage
            .get_metadata(FileArea::Download, "translated_a_1.pdf")
            .await
            .unwrap();
        assert_eq!(meta.display_name, "translated_a_1.pdf");
        assert_eq!(meta.mime_type, "application/pdf");
        assert_eq!(meta.size, 4);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (root, storage) = open_temp().await;
        let key = storage
            .put(FileArea::Upload, Bytes::from_static(b"x"), "a.pdf", "application/pdf")
            .await
            .unwrap();

        storage.delete(FileArea::Upload, &key).await.unwrap();
        storage.delete(FileArea::Upload, &key).await.unwrap();

        assert!(!root.path().join("uploads").join(&key).exists());
        assert!(
            !root
                .path()
                .join("uploads")
                .join(format!("{key}{SIDECAR_SUFFIX}"))
                .exists()
        );
        assert!(matches!(
            storage.get_metadata(FileArea::Upload, &key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_put_named_never_overwrites() {
        let (_root, storage) = open_temp().await;
        storage
            .put_named(FileArea::Download, "out.txt", Bytes::from_static(b"1"), "out.txt", "text/plain")
            .await
            .unwrap();
        let second = storage
            .put_named(FileArea::Download, "out.txt", Bytes::from_static(b"2"), "out.txt", "text/plain")
            .await;
        assert!(matches!(second, Err(StorageError::Conflict(_))));
        assert_eq!(storage.get(FileArea::Download, "out.txt").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_rejects_traversal_and_sidecar_keys() {
        let (_root, storage) = open_temp().await;
        assert!(matches!(
            storage.get(FileArea::Download, "../uploads/secret").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.get(FileArea::Upload, "a.pdf.meta.json").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(storage.resolve_local_path(FileArea::Download, "..").is_none());
    }

    #[tokio::test]
    async fn test_resolve_local_path_does_no_io() {
        let (root, storage) = open_temp().await;
        let path = storage
            .resolve_local_path(FileArea::Download, "translated_x_1.docx")
            .unwrap();
        assert_eq!(path, root.path().join("downloads").join("translated_x_1.docx"));
        assert!(!path.exists());
    }
}
