//! Diagnosis service and result assembly
//!
//! `DiagnosisService` owns one inference engine per served crop together with
//! the advisory table and product matcher, and runs the whole request flow:
//! preprocess, classify, gate, then attach advice and products.

use std::collections::HashMap;

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::advisory::AdvisoryTable;
use crate::catalog::{InMemoryCatalog, ProductCatalog, ProductMatcher, RecommendedProduct};
use crate::config::ServiceConfig;
use crate::inference::{InferenceEngine, PredictionResult, Preprocessor};
use crate::labels::Crop;
use crate::model::{Classifier, DiseaseClassifier};
use crate::utils::error::{CropSightError, Result};

/// Caller-facing result of an accepted diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub disease_class: String,

    /// Top-1 confidence in percent
    pub confidence: f32,

    /// Agronomic advice; `null` when the class has no entry
    #[serde(rename = "additional_info")]
    pub advisory_message: Option<String>,

    #[serde(rename = "products")]
    pub recommended_products: Vec<RecommendedProduct>,
}

impl PredictionResponse {
    /// Combine an accepted prediction with its advice and products
    pub fn assemble(
        result: &PredictionResult,
        advisory: Option<&str>,
        products: Vec<RecommendedProduct>,
    ) -> Self {
        Self {
            disease_class: result.predicted_class.clone(),
            confidence: result.confidence,
            advisory_message: advisory.map(str::to_string),
            recommended_products: products,
        }
    }
}

/// Build the catalog a config points at
///
/// No `catalog_path` gives an empty catalog; a configured file that cannot be
/// read is an error.
pub fn load_catalog(config: &ServiceConfig) -> Result<InMemoryCatalog> {
    match &config.catalog_path {
        Some(path) => InMemoryCatalog::from_json_file(path),
        None => Ok(InMemoryCatalog::default()),
    }
}

/// Per-crop disease diagnosis
pub struct DiagnosisService<B: Backend, M: Classifier<B> = DiseaseClassifier<B>> {
    engines: HashMap<Crop, InferenceEngine<B, M>>,
    advisories: AdvisoryTable,
    matcher: ProductMatcher,
}

impl<B: Backend> DiagnosisService<B> {
    /// Load an engine for every configured crop
    ///
    /// Any missing or incompatible weights file fails the whole service with
    /// [`CropSightError::ModelLoad`].
    pub fn from_config(
        config: &ServiceConfig,
        catalog: Box<dyn ProductCatalog + Send + Sync>,
        device: B::Device,
    ) -> Result<Self> {
        config.validate()?;

        let matcher = ProductMatcher::new(catalog, config.product_limit);
        let mut service = Self::new(AdvisoryTable::default(), matcher);

        for crop_config in &config.crops {
            let engine = InferenceEngine::<B>::load(
                &crop_config.weights_path,
                &crop_config.classifier_config(),
                crop_config.labels.clone(),
                device.clone(),
            )?
            .with_preprocessor(Preprocessor::new(config.image_size as u32))
            .with_threshold(config.confidence_threshold);

            service = service.with_engine(crop_config.crop, engine);
        }

        info!(
            "Diagnosis service ready for {} crop(s), threshold {:.1}%",
            service.engines.len(),
            config.confidence_threshold
        );

        Ok(service)
    }
}

impl<B: Backend, M: Classifier<B>> DiagnosisService<B, M> {
    pub fn new(advisories: AdvisoryTable, matcher: ProductMatcher) -> Self {
        Self {
            engines: HashMap::new(),
            advisories,
            matcher,
        }
    }

    /// Serve `crop` with `engine`, replacing any previous engine
    pub fn with_engine(mut self, crop: Crop, engine: InferenceEngine<B, M>) -> Self {
        let missing = self.advisories.missing(engine.labels().iter());
        if !missing.is_empty() {
            debug!("No advisory text for {} labels: {:?}", crop, missing);
        }
        self.engines.insert(crop, engine);
        self
    }

    /// Diagnose an uploaded leaf image for `crop`
    ///
    /// Errors:
    /// * [`CropSightError::UnknownCrop`] - no engine for `crop`
    /// * [`CropSightError::ImageDecode`] - bytes are not an image
    /// * [`CropSightError::LowConfidence`] - the model is not sure enough
    pub fn diagnose(&self, crop: Crop, image_bytes: &[u8]) -> Result<PredictionResponse> {
        let engine = self
            .engines
            .get(&crop)
            .ok_or_else(|| CropSightError::UnknownCrop(crop.to_string()))?;

        let result = engine.predict(image_bytes)?;
        let advisory = self.advisories.advisory_for(&result.predicted_class);
        let products = self.matcher.find_matches(&result.predicted_class);

        debug!(
            "{}: {} ({:.2}%), {} products",
            crop,
            result.predicted_class,
            result.confidence,
            products.len()
        );

        Ok(PredictionResponse::assemble(&result, advisory, products))
    }

    /// Served crops, in a stable order
    pub fn crops(&self) -> Vec<Crop> {
        let mut crops: Vec<Crop> = self.engines.keys().copied().collect();
        crops.sort();
        crops
    }

    pub fn engine(&self, crop: Crop) -> Option<&InferenceEngine<B, M>> {
        self.engines.get(&crop)
    }

    pub fn advisories(&self) -> &AdvisoryTable {
        &self.advisories
    }
}
