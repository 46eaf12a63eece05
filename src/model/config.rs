//! Model Configuration Module
//!
//! Two architecture variants are deployed: a shallow 32/64-channel network
//! for the 3-class potato model and a deeper 64..512-channel network with a
//! dropout-regularized head for the multi-crop models. Everything that differs
//! between them is derived from [`ModelVariant`].

use burn::config::Config;
use serde::{Deserialize, Serialize};

use crate::utils::error::CropSightError;

/// Named CNN architecture variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Conv channels 3 -> 32 -> 64 -> 64 -> 64, head 64 -> 64 -> n
    Shallow,
    /// Conv channels 3 -> 64 -> 128 -> 256 -> 512, head 512 -> 256 -> n
    Deep,
}

impl ModelVariant {
    /// Output channels of the four convolutional blocks
    pub fn conv_channels(&self) -> [usize; 4] {
        match self {
            ModelVariant::Shallow => [32, 64, 64, 64],
            ModelVariant::Deep => [64, 128, 256, 512],
        }
    }

    /// Width of the hidden fully connected layer
    pub fn hidden_units(&self) -> usize {
        match self {
            ModelVariant::Shallow => 64,
            ModelVariant::Deep => 256,
        }
    }

    /// Dropout rate in the classifier head
    pub fn head_dropout(&self) -> f64 {
        match self {
            ModelVariant::Shallow => 0.4,
            ModelVariant::Deep => 0.5,
        }
    }

    /// Spatial dropout applied in the last conv block before pooling
    pub fn last_block_dropout(&self) -> Option<f64> {
        match self {
            ModelVariant::Shallow => None,
            ModelVariant::Deep => Some(0.3),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Shallow => "shallow",
            ModelVariant::Deep => "deep",
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Configuration for the [`DiseaseClassifier`](super::DiseaseClassifier)
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Architecture variant
    pub variant: ModelVariant,

    /// Number of output classes; must equal what the weights were trained with
    pub num_classes: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Convolution kernel size (square)
    #[config(default = "3")]
    pub kernel_size: usize,
}

impl ClassifierConfig {
    /// Validate the configuration before building a model
    pub fn validate(&self) -> crate::utils::error::Result<()> {
        if self.num_classes == 0 {
            return Err(CropSightError::Config(
                "num_classes must be greater than 0".to_string(),
            ));
        }

        if self.in_channels == 0 {
            return Err(CropSightError::Config(
                "in_channels must be greater than 0".to_string(),
            ));
        }

        if self.kernel_size < 1 || self.kernel_size % 2 == 0 {
            return Err(CropSightError::Config(
                "kernel_size must be a positive odd number".to_string(),
            ));
        }

        Ok(())
    }
}
