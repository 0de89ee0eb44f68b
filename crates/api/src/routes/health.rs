//! Health check endpoint handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: BackendInfo,
}

/// Backend the service is bound to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendInfo {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
}

/// Liveness check.
///
/// Reports the running version and backend binding. The hosted backend is
/// not contacted; its failures surface on the calls that need it.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend = &state.config.backend;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: BackendInfo {
            endpoint: backend.endpoint.clone(),
            project_id: backend.project_id.clone(),
            database_id: backend.database_id.clone(),
        },
    })
}
