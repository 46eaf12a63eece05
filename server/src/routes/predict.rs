//! Prediction endpoint - POST /:crop/predict with a multipart `image` field

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cropsight::{Crop, CropSightError, PredictionResponse};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::envelope::ApiResponse;
use crate::state::SharedState;

/// Multipart field carrying the upload
pub const IMAGE_FIELD: &str = "image";

/// POST /:crop/predict - Diagnose an uploaded leaf image
pub async fn predict(
    State(state): State<SharedState>,
    Path(crop): Path<String>,
    multipart: Multipart,
) -> Response {
    let request_id = Uuid::new_v4();

    let crop: Crop = match crop.parse() {
        Ok(crop) => crop,
        Err(e) => return ApiResponse::from_error(&e).into_response(),
    };
    if let Err(e) = state.service(crop) {
        return ApiResponse::from_error(&e).into_response();
    }

    let bytes = match read_image(multipart).await {
        Ok(bytes) => bytes,
        Err(message) => {
            warn!("[{}] {}", request_id, message);
            return ApiResponse::failure(StatusCode::BAD_REQUEST, message, "missing_image")
                .into_response();
        }
    };

    info!("[{}] {} prediction, {} bytes", request_id, crop, bytes.len());

    let task_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<PredictionResponse, CropSightError> {
        let service = task_state
            .service(crop)?
            .lock()
            .map_err(|_| CropSightError::Inference(format!("{} service lock poisoned", crop)))?;
        service.diagnose(crop, &bytes)
    })
    .await;

    match outcome {
        Ok(Ok(response)) => {
            info!(
                "[{}] {} ({:.2}%)",
                request_id, response.disease_class, response.confidence
            );
            ApiResponse::ok("Prediction successful", response).into_response()
        }
        Ok(Err(e)) => {
            if e.is_client_error() {
                info!("[{}] rejected: {}", request_id, e);
            } else {
                error!("[{}] failed: {}", request_id, e);
            }
            ApiResponse::from_error(&e).into_response()
        }
        Err(e) => {
            error!("[{}] inference task failed: {}", request_id, e);
            ApiResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Inference task failed",
                "internal",
            )
            .into_response()
        }
    }
}

/// Bytes of the `image` field
async fn read_image(mut multipart: Multipart) -> Result<Vec<u8>, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid multipart body: {}", e))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read image field: {}", e))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(format!("Missing '{}' field", IMAGE_FIELD))
}
