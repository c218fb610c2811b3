use super::{
    FileArea, StorageBackend, StorageError, StoredFileMetadata, generate_key, validate_key,
};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::path::PathBuf;

/// User metadata entry that carries the original display name.
const ORIGINAL_NAME_META: &str = "originalname";

/// S3/MinIO object store. Areas become key prefixes (`uploads/`, `downloads/`).
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn object_key(area: FileArea, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!("{}/{}", area.prefix(), key))
    }
}

/// `If-None-Match: *` lost against an existing object (412) or a concurrent write (409).
fn is_write_conflict(status: u16) -> bool {
    status == 412 || status == 409
}

fn backend_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(e.to_string())
}

#[async_trait]
impl StorageBackend for S3Storage {
    fn backend_name(&self) -> &'static str {
        "s3"
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
        let object_key = Self::object_key(area, name)?;
        // S3 user metadata must stay ASCII
        let encoded_name = utf8_percent_encode(display_name, NON_ALPHANUMERIC).to_string();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(mime_type)
            .metadata(ORIGINAL_NAME_META, encoded_name)
            .if_none_match("*")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                if status.is_some_and(is_write_conflict) {
                    return StorageError::Conflict(name.to_string());
                }
                tracing::error!(
                    "S3 put_object failed: bucket={}, key={}, error={:?}",
                    self.bucket,
                    object_key,
                    e
                );
                backend_error(e)
            })?;

        Ok(name.to_string())
    }

    async fn get(&self, area: FileArea, key: &str) -> Result<Bytes, StorageError> {
        let object_key = Self::object_key(area, key)?;
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await;

        match res {
            Ok(output) => {
                let data = output.body.collect().await.map_err(backend_error)?;
                Ok(data.into_bytes())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Err(StorageError::NotFound(key.to_string()))
                } else {
                    Err(backend_error(service_error))
                }
            }
        }
    }

    async fn get_metadata(
        &self,
        area: FileArea,
        key: &str,
    ) -> Result<StoredFileMetadata, StorageError> {
        let object_key = Self::object_key(area, key)?;
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await;

        let head = match res {
            Ok(head) => head,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    return Err(StorageError::NotFound(key.to_string()));
                }
                return Err(backend_error(service_error));
            }
        };

        let display_name = head
            .metadata()
            .and_then(|m| m.get(ORIGINAL_NAME_META))
            .map(|v| percent_decode_str(v).decode_utf8_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());

        Ok(StoredFileMetadata {
            mime_type: head
                .content_type()
                .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
                .to_string(),
            display_name,
            size: head.content_length().unwrap_or(0).max(0) as u64,
        })
    }

    async fn delete(&self, area: FileArea, key: &str) -> Result<(), StorageError> {
        let object_key = Self::object_key(area, key)?;
        // DeleteObject succeeds for keys that do not exist
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    fn resolve_local_path(&self, _area: FileArea, _name: &str) -> Option<PathBuf> {
        None
    }

    async fn health_check(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keys_are_prefixed_by_area() {
        assert_eq!(
            S3Storage::object_key(FileArea::Upload, "a.pdf").unwrap(),
            "uploads/a.pdf"
        );
        assert_eq!(
            S3Storage::object_key(FileArea::Download, "translated_a_1.pdf").unwrap(),
            "downloads/translated_a_1.pdf"
        );
        assert!(S3Storage::object_key(FileArea::Download, "../uploads/a.pdf").is_err());
    }

    #[test]
    fn test_conditional_write_statuses() {
        assert!(is_write_conflict(412));
        assert!(is_write_conflict(409));
        assert!(!is_write_conflict(403));
        assert!(!is_write_conflict(500));
    }
}
