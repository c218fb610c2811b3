use super::{
    FileArea, StorageBackend, StorageError, StoredFileMetadata, generate_key, validate_key,
};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::path::PathBuf;

struct StoredObject {
    data: Bytes,
    metadata: StoredFileMetadata,
}

/// Keeps every payload in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    objects: DashMap<(FileArea, String), StoredObject>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads currently held in `area`.
    pub fn len(&self, area: FileArea) -> usize {
        self.objects.iter().filter(|e| e.key().0 == area).count()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, area: FileArea, key: &str) -> bool {
        self.objects.contains_key(&(area, key.to_string()))
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
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
        validate_key(name)?;

        match self.objects.entry((area, name.to_string())) {
            Entry::Occupied(_) => Err(StorageError::Conflict(name.to_string())),
            Entry::Vacant(slot) => {
                let metadata = StoredFileMetadata {
                    mime_type: mime_type.to_string(),
                    display_name: display_name.to_string(),
                    size: data.len() as u64,
                };
                slot.insert(StoredObject { data, metadata });
                Ok(name.to_string())
            }
        }
    }

    async fn get(&self, area: FileArea, key: &str) -> Result<Bytes, StorageError> {
        validate_key(key)?;
        self.objects
            .get(&(area, key.to_string()))
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn get_metadata(
        &self,
        area: FileArea,
        key: &str,
    ) -> Result<StoredFileMetadata, StorageError> {
        validate_key(key)?;
        self.objects
            .get(&(area, key.to_string()))
            .map(|object| object.metadata.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, area: FileArea, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.objects.remove(&(area, key.to_string()));
        Ok(())
    }

    fn resolve_local_path(&self, _area: FileArea, _name: &str) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_round_trip_and_not_found() {
        let storage = MemoryStorage::new();
        let key = storage
            .put(FileArea::Upload, Bytes::from_static(b"abc"), "a.pdf", "application/pdf")
            .await
            .unwrap();

        assert_eq!(storage.get(FileArea::Upload, &key).await.unwrap(), "abc");
        let meta = storage.get_metadata(FileArea::Upload, &key).await.unwrap();
        assert_eq!(meta.display_name, "a.pdf");
        assert_eq!(meta.size, 3);

        storage.delete(FileArea::Upload, &key).await.unwrap();
        storage.delete(FileArea::Upload, &key).await.unwrap();
        assert!(matches!(
            storage.get(FileArea::Upload, &key).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_puts_issue_distinct_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .put(
                        FileArea::Upload,
                        Bytes::from(format!("payload-{i}")),
                        "same-name.docx",
                        "application/octet-stream",
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut keys = HashSet::new();
        for handle in handles {
            keys.insert(handle.await.unwrap());
        }
        assert_eq!(keys.len(), 64);
        assert_eq!(storage.len(FileArea::Upload), 64);
    }

    #[tokio::test]
    async fn test_has_no_local_paths() {
        let storage = MemoryStorage::new();
        assert!(storage.resolve_local_path(FileArea::Download, "a.pdf").is_none());
    }
}
