//! Model module for the disease classification CNN using the Burn framework
//!
//! This module provides:
//! - The CNN architecture with its `Shallow` and `Deep` variants
//! - Model configuration
//! - Weight loading with shape verification, and saving

pub mod cnn;
pub mod config;
pub mod weights;

use burn::tensor::{backend::Backend, Tensor};

pub use cnn::{ConvBlock, DiseaseClassifier};
pub use config::{ClassifierConfig, ModelVariant};
pub use weights::{weights_file, WEIGHTS_EXTENSION};

/// Anything that scores a preprocessed image batch
///
/// Implemented by [`DiseaseClassifier`]; the inference engine only needs this
/// capability, so it can run any architecture variant.
pub trait Classifier<B: Backend> {
    /// Raw class scores `[batch, num_classes]` for an input `[batch, 3, H, W]`
    fn logits(&self, input: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Number of classes the scores cover
    fn num_classes(&self) -> usize;
}
