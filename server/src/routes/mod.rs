pub mod crops;
pub mod health;
pub mod predict;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::SharedState;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// All API routes bound to `state`
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/crops", get(crops::list_crops))
        .route("/:crop/predict", post(predict::predict))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
