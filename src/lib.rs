pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers;
use crate::config::AppConfig;
use crate::services::orchestrator::TranslationOrchestrator;
use crate::services::storage::StorageBackend;
use crate::services::translator::Translator;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and the text fields next to the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::translate::translate_upload,
        handlers::translate::translate_stored,
        handlers::upload::upload_file,
        handlers::download::download_file,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::translate::TranslateStoredRequest,
            models::TranslationResult,
            models::UploadResponse,
        )
    ),
    tags(
        (name = "translation", description = "Document translation endpoints"),
        (name = "files", description = "Upload and download endpoints"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
    pub orchestrator: Arc<TranslationOrchestrator>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn StorageBackend>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let orchestrator = Arc::new(TranslationOrchestrator::new(storage.clone(), translator));
        Self {
            storage,
            orchestrator,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/translate", post(handlers::translate::translate_upload))
        .route("/upload", post(handlers::upload::upload_file))
        .route(
            "/files/:key/translate",
            post(handlers::translate::translate_stored),
        )
        .route(
            "/downloads/:filename",
            get(handlers::download::download_file),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
