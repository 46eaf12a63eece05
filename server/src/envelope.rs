//! Response envelope shared by every endpoint
//!
//! `{success, message, status, data, error, error_code}` with the HTTP status
//! mirrored in the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cropsight::CropSightError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub status: u16,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            status: StatusCode::OK.as_u16(),
            data: Some(data),
            error: None,
            error_code: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(status: StatusCode, error: impl Into<String>, error_code: &str) -> Self {
        Self {
            success: false,
            message: String::new(),
            status: status.as_u16(),
            data: None,
            error: Some(error.into()),
            error_code: Some(error_code.to_string()),
        }
    }

    /// Envelope for a pipeline error
    pub fn from_error(err: &CropSightError) -> Self {
        Self::failure(status_for(err), err.to_string(), err.code())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// HTTP status for a pipeline error
pub fn status_for(err: &CropSightError) -> StatusCode {
    match err {
        CropSightError::UnknownCrop(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
