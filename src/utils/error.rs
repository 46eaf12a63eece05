//! Error Handling Module
//!
//! Defines the error taxonomy of the disease prediction pipeline.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Main error type for CropSight operations
#[derive(Error, Debug)]
pub enum CropSightError {
    /// The uploaded bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// Weights file missing, unreadable or incompatible with the architecture
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// Top-1 confidence fell below the acceptance threshold
    #[error(
        "Cannot classify, please upload a clearer image (confidence {confidence:.2}% is below {threshold:.2}%)"
    )]
    LowConfidence { confidence: f32, threshold: f32 },

    /// No engine is configured for the requested crop
    #[error("Unknown crop: {0}")]
    UnknownCrop(String),

    /// Product catalog lookup failed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during the forward pass or output extraction
    #[error("Inference error: {0}")]
    Inference(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CropSightError {
    /// Whether the error was caused by the caller's input rather than a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CropSightError::ImageDecode(_)
                | CropSightError::LowConfidence { .. }
                | CropSightError::UnknownCrop(_)
        )
    }

    /// Short machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            CropSightError::ImageDecode(_) => "image_decode",
            CropSightError::ModelLoad(_) => "model_load",
            CropSightError::LowConfidence { .. } => "low_confidence",
            CropSightError::UnknownCrop(_) => "unknown_crop",
            CropSightError::Catalog(_) => "catalog",
            CropSightError::Config(_) => "config",
            CropSightError::Inference(_) => "inference",
            CropSightError::Io(_) => "io",
            CropSightError::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for CropSightError {
    fn from(err: serde_json::Error) -> Self {
        CropSightError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for CropSightError {
    fn from(err: image::ImageError) -> Self {
        CropSightError::ImageDecode(err.to_string())
    }
}

/// Convenience Result type for CropSight operations
pub type Result<T> = std::result::Result<T, CropSightError>;
