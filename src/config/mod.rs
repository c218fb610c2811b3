use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::utils::validation::MAX_FILE_SIZE;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("Unknown storage backend '{0}' (expected filesystem, s3 or memory)")]
    UnknownStorageBackend(String),
}

/// Which storage backend the process binds at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Filesystem {
        upload_dir: PathBuf,
        download_dir: PathBuf,
    },
    S3(S3Config),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

/// Settings for the external translation provider.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Provider credential; absence is fatal when the gateway is built
    pub api_key: Option<String>,

    /// Overrides the host picked from the key tier
    pub api_url: Option<String>,

    /// Delay between document status checks (default: 1 s)
    pub poll_interval: Duration,

    /// Upper bound for one whole translation job (default: 10 min)
    pub timeout: Duration,

    /// Timeout for each HTTP request to the provider (default: 120 s)
    pub request_timeout: Duration,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(600),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,

    /// Maximum upload size in bytes (default: 30 MB)
    pub max_file_size: usize,

    /// Remove a translated artifact once it has been downloaded (default: true)
    pub delete_after_download: bool,

    pub storage: StorageConfig,
    pub translator: TranslatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            max_file_size: MAX_FILE_SIZE,
            delete_after_download: true,
            storage: StorageConfig::Filesystem {
                upload_dir: PathBuf::from("uploads"),
                download_dir: PathBuf::from("downloads"),
            },
            translator: TranslatorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let storage = match var("STORAGE_BACKEND")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            None | Some("filesystem") | Some("local") => StorageConfig::Filesystem {
                upload_dir: var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("uploads")),
                download_dir: var("DOWNLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("downloads")),
            },
            Some("s3") | Some("minio") => StorageConfig::S3(S3Config {
                endpoint: var("MINIO_ENDPOINT").ok_or(ConfigError::Missing("MINIO_ENDPOINT"))?,
                access_key: var("MINIO_ACCESS_KEY")
                    .ok_or(ConfigError::Missing("MINIO_ACCESS_KEY"))?,
                secret_key: var("MINIO_SECRET_KEY")
                    .ok_or(ConfigError::Missing("MINIO_SECRET_KEY"))?,
                bucket: var("MINIO_BUCKET").ok_or(ConfigError::Missing("MINIO_BUCKET"))?,
                region: var("MINIO_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            }),
            Some("memory") => StorageConfig::Memory,
            Some(other) => return Err(ConfigError::UnknownStorageBackend(other.to_string())),
        };

        let translator = TranslatorConfig {
            api_key: var("DEEPL_API_KEY"),
            api_url: var("DEEPL_API_URL"),
            poll_interval: parse(&var, "TRANSLATION_POLL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(default.translator.poll_interval),
            timeout: parse(&var, "TRANSLATION_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(default.translator.timeout),
            request_timeout: parse(&var, "TRANSLATION_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(default.translator.request_timeout),
        };

        Ok(Self {
            host: parse(&var, "HOST")?.unwrap_or(default.host),
            port: parse(&var, "PORT")?.unwrap_or(default.port),
            max_file_size: parse(&var, "MAX_FILE_SIZE")?.unwrap_or(default.max_file_size),
            delete_after_download: var("DELETE_AFTER_DOWNLOAD")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.delete_after_download),
            storage,
            translator,
        })
    }

    /// Create config for development and tests (in-memory storage)
    pub fn development() -> Self {
        Self {
            delete_after_download: false,
            storage: StorageConfig::Memory,
            translator: TranslatorConfig {
                api_key: Some("development-key:fx".to_string()),
                ..TranslatorConfig::default()
            },
            ..Self::default()
        }
    }
}

fn parse<T, F>(var: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
