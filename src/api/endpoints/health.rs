//! Health check endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub time: String,
    pub version: &'static str,
}

/// `GET /api/health` — liveness probe.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time: chrono::Local::now().to_rfc3339(),
        version: crate::config::APP_VERSION,
    })
}
