//! Inference module for single-image disease prediction
//!
//! This module provides:
//! - Image decoding, resizing and normalization
//! - The inference engine with its confidence gate

pub mod engine;
pub mod preprocess;

pub use engine::{
    top1, ConfidenceGate, InferenceEngine, PredictionResult, DEFAULT_CONFIDENCE_THRESHOLD,
};
pub use preprocess::{PreprocessedImage, Preprocessor, DEFAULT_IMAGE_SIZE, MAX_IMAGE_SIZE, NORMALIZE_MEAN, NORMALIZE_STD};
