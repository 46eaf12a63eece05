//! Service configuration
//!
//! A JSON document listing the crops to serve, with their architecture,
//! weights file and label set, plus the pipeline-wide settings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_PRODUCT_LIMIT;
use crate::inference::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IMAGE_SIZE, MAX_IMAGE_SIZE};
use crate::labels::{Crop, LabelSet};
use crate::model::{ClassifierConfig, ModelVariant};
use crate::utils::error::{CropSightError, Result};

/// Environment variable holding the config file path
pub const CONFIG_ENV: &str = "CROPSIGHT_CONFIG";

/// One served crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    pub crop: Crop,
    pub variant: ModelVariant,
    /// Weights file, with or without the `.mpk` extension
    pub weights_path: PathBuf,
    /// Class names in training index order
    pub labels: LabelSet,
}

impl CropConfig {
    /// Stock settings for `crop`, with weights under `weights_dir`
    pub fn for_crop(crop: Crop, weights_dir: &Path) -> Self {
        Self {
            crop,
            variant: crop.default_variant(),
            weights_path: weights_dir.join(crop.as_str()),
            labels: crop.default_labels(),
        }
    }

    /// Architecture this crop's weights were built with
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig::new(self.variant, self.labels.len())
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Minimum top-1 confidence, in percent
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,

    /// Maximum products attached to a response
    #[serde(default = "default_product_limit")]
    pub product_limit: usize,

    /// Model input resolution
    #[serde(default = "default_image_size")]
    pub image_size: usize,

    /// JSON product list; no catalog means no product recommendations
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    pub crops: Vec<CropConfig>,
}

fn default_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_product_limit() -> usize {
    DEFAULT_PRODUCT_LIMIT
}

fn default_image_size() -> usize {
    DEFAULT_IMAGE_SIZE as usize
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let weights_dir = Path::new("weights");
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            product_limit: DEFAULT_PRODUCT_LIMIT,
            image_size: DEFAULT_IMAGE_SIZE as usize,
            catalog_path: Some(PathBuf::from("data/catalog.json")),
            crops: Crop::ALL
                .iter()
                .map(|&crop| CropConfig::for_crop(crop, weights_dir))
                .collect(),
        }
    }
}

impl ServiceConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CropSightError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| CropSightError::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(CropSightError::Config(format!(
                "confidence_threshold must be within [0, 100], got {}",
                self.confidence_threshold
            )));
        }

        if self.product_limit == 0 {
            return Err(CropSightError::Config(
                "product_limit must be greater than 0".to_string(),
            ));
        }

        if self.image_size == 0 || self.image_size > MAX_IMAGE_SIZE as usize {
            return Err(CropSightError::Config(format!(
                "image_size must be within [1, {}], got {}",
                MAX_IMAGE_SIZE, self.image_size
            )));
        }

        if self.crops.is_empty() {
            return Err(CropSightError::Config("no crops configured".to_string()));
        }

        let mut seen = HashSet::new();
        for crop in &self.crops {
            if !seen.insert(crop.crop) {
                return Err(CropSightError::Config(format!(
                    "crop '{}' is configured twice",
                    crop.crop
                )));
            }
            crop.labels.validate().map_err(|e| {
                CropSightError::Config(format!("labels for '{}': {}", crop.crop, e))
            })?;
        }

        Ok(())
    }

    /// Settings for `crop`, if it is served
    pub fn crop(&self, crop: Crop) -> Option<&CropConfig> {
        self.crops.iter().find(|c| c.crop == crop)
    }

    /// A copy of this config that serves only `crop`
    pub fn only(&self, crop: Crop) -> Option<Self> {
        let crop_config = self.crop(crop)?.clone();
        Some(Self {
            crops: vec![crop_config],
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deployment() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.confidence_threshold, 75.0);
        assert_eq!(config.product_limit, 10);
        assert_eq!(config.image_size, 224);
        assert_eq!(config.crops.len(), 3);

        let potato = config.crop(Crop::Potato).unwrap();
        assert_eq!(potato.variant, ModelVariant::Shallow);
        assert_eq!(potato.classifier_config().num_classes, 3);

        let cotton = config.crop(Crop::Cotton).unwrap();
        assert_eq!(cotton.variant, ModelVariant::Deep);
        assert_eq!(cotton.classifier_config().num_classes, 4);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cropsight.json");

        let mut config = ServiceConfig::default();
        config.confidence_threshold = 80.0;
        config.save(&path).unwrap();

        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ServiceConfig = serde_json::from_str(
            r#"{"crops": [{"crop": "wheat", "variant": "deep",
                "weights_path": "w/wheat", "labels": ["Brown_Rust", "Healthy", "Yellow_Rust"]}]}"#,
        )
        .unwrap();

        assert_eq!(config.confidence_threshold, 75.0);
        assert_eq!(config.product_limit, 10);
        assert_eq!(config.catalog_path, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServiceConfig::default();
        config.confidence_threshold = 120.0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.product_limit = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.image_size = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.image_size = 70_000;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.image_size = MAX_IMAGE_SIZE as usize;
        assert!(config.validate().is_ok());

        let mut config = ServiceConfig::default();
        config.crops.clear();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        let duplicate = config.crops[0].clone();
        config.crops.push(duplicate);
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.crops[1].labels = LabelSet::new(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_only_keeps_shared_settings() {
        let mut config = ServiceConfig::default();
        config.confidence_threshold = 90.0;

        let wheat = config.only(Crop::Wheat).unwrap();
        assert_eq!(wheat.crops.len(), 1);
        assert_eq!(wheat.crops[0].crop, Crop::Wheat);
        assert_eq!(wheat.confidence_threshold, 90.0);
        assert!(wheat.validate().is_ok());

        config.crops.retain(|c| c.crop != Crop::Cotton);
        assert!(config.only(Crop::Cotton).is_none());
    }

    #[test]
    fn test_load_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ServiceConfig::load(&dir.path().join("absent.json")),
            Err(CropSightError::Config(_))
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"crops": [{"crop": "rice"}]}"#).unwrap();
        assert!(matches!(ServiceConfig::load(&path), Err(CropSightError::Config(_))));
    }
}
