//! Served crops and their label sets

use axum::extract::State;
use cropsight::{Crop, LabelSet, ModelVariant};
use serde::Serialize;

use crate::envelope::ApiResponse;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct CropInfo {
    pub crop: Crop,
    pub variant: ModelVariant,
    pub labels: LabelSet,
    pub endpoint: String,
}

/// GET /crops - List served crops
pub async fn list_crops(State(state): State<SharedState>) -> ApiResponse<Vec<CropInfo>> {
    let crops = state
        .config
        .crops
        .iter()
        .filter(|c| state.crops.contains(&c.crop))
        .map(|c| CropInfo {
            crop: c.crop,
            variant: c.variant,
            labels: c.labels.clone(),
            endpoint: format!("/{}/predict", c.crop),
        })
        .collect();

    ApiResponse::ok("Crops listed", crops)
}
