use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub active_translations: usize,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_ok = state.storage.health_check().await;

    Json(HealthResponse {
        status: (if storage_ok { "ok" } else { "degraded" }).to_string(),
        storage: if storage_ok {
            format!("{} (connected)", state.storage.backend_name())
        } else {
            format!("{} (unreachable)", state.storage.backend_name())
        },
        active_translations: state.orchestrator.in_flight(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
