use crate::config::{S3Config, StorageConfig};
use crate::services::storage::{FilesystemStorage, MemoryStorage, S3Storage, StorageBackend};
use anyhow::Context;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_storage(config: &StorageConfig) -> anyhow::Result<Arc<dyn StorageBackend>> {
    let storage: Arc<dyn StorageBackend> = match config {
        StorageConfig::Filesystem {
            upload_dir,
            download_dir,
        } => Arc::new(
            FilesystemStorage::open(upload_dir.clone(), download_dir.clone())
                .await
                .context("failed to prepare storage directories")?,
        ),
        StorageConfig::S3(s3) => Arc::new(setup_s3(s3).await?),
        StorageConfig::Memory => {
            warn!("🧪 In-memory storage selected; nothing survives a restart");
            Arc::new(MemoryStorage::new())
        }
    };

    info!("💾 Storage backend: {}", storage.backend_name());
    Ok(storage)
}

async fn setup_s3(config: &S3Config) -> anyhow::Result<S3Storage> {
    info!(
        "☁️  S3 Storage: {} (Bucket: {})",
        config.endpoint, config.bucket
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&config.endpoint)
        .region(Region::new(config.region.clone()))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let client = aws_sdk_s3::Client::from_conf(s3_config);
    ensure_bucket(&client, &config.bucket).await?;
    Ok(S3Storage::new(client, config.bucket.clone()))
}

async fn ensure_bucket(client: &aws_sdk_s3::Client, bucket: &str) -> anyhow::Result<()> {
    if client.head_bucket().bucket(bucket).send().await.is_ok() {
        return Ok(());
    }

    info!("🪣 Creating bucket {}", bucket);
    client
        .create_bucket()
        .bucket(bucket)
        .send()
        .await
        .with_context(|| format!("failed to create bucket {bucket}"))?;
    Ok(())
}
