use bytes::Bytes;
use rust_translate_backend::config::{S3Config, StorageConfig};
use rust_translate_backend::infrastructure::storage::setup_storage;
use rust_translate_backend::services::storage::{FileArea, StorageError};

// Needs MinIO on 127.0.0.1:9000: cargo test -- --ignored
#[tokio::test]
#[ignore]
async fn test_s3_round_trip_against_minio() {
    let storage = setup_storage(&StorageConfig::S3(S3Config {
        endpoint: "http://127.0.0.1:9000".to_string(),
        access_key: "minioadmin".to_string(),
        secret_key: "minioadmin".to_string(),
        bucket: "translate-test".to_string(),
        region: "us-east-1".to_string(),
    }))
    .await
    .unwrap();
    assert!(storage.health_check().await);
    assert!(storage.resolve_local_path(FileArea::Upload, "a.pdf").is_none());

    let key = storage
        .put(
            FileArea::Upload,
            Bytes::from_static(b"Ol\xc3\xa1"),
            "Relatório.txt",
            "text/plain",
        )
        .await
        .unwrap();
    assert!(key.ends_with(".txt"));

    let meta = storage.get_metadata(FileArea::Upload, &key).await.unwrap();
    assert_eq!(meta.display_name, "Relatório.txt");
    assert_eq!(meta.mime_type, "text/plain");
    assert_eq!(meta.size, 4);
    assert_eq!(storage.get(FileArea::Upload, &key).await.unwrap(), "Olá");

    // Existing keys are never overwritten
    assert!(matches!(
        storage
            .put_named(
                FileArea::Upload,
                &key,
                Bytes::from_static(b"other"),
                "other.txt",
                "text/plain",
            )
            .await,
        Err(StorageError::Conflict(_))
    ));
    assert_eq!(storage.get(FileArea::Upload, &key).await.unwrap(), "Olá");

    // Areas are separate prefixes
    assert!(matches!(
        storage.get(FileArea::Download, &key).await,
        Err(StorageError::NotFound(_))
    ));

    storage.delete(FileArea::Upload, &key).await.unwrap();
    storage.delete(FileArea::Upload, &key).await.unwrap();
    assert!(matches!(
        storage.get_metadata(FileArea::Upload, &key).await,
        Err(StorageError::NotFound(_))
    ));
}
