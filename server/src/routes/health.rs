//! Health check endpoint

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use cropsight::backend::backend_name;
use cropsight::Crop;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub started_at: DateTime<Utc>,
    pub version: String,
    pub backend: String,
    pub crops: Vec<Crop>,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
        started_at: state.started_at_utc,
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: backend_name().to_string(),
        crops: state.crops.clone(),
    })
}
