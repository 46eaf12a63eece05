//! # CropSight
//!
//! Crop disease diagnosis from leaf photos using the Burn framework.
//!
//! ## Features
//!
//! - **Two CNN variants** (`Shallow`, `Deep`) selected per crop by configuration
//! - **Confidence-gated inference**: predictions below 75% are rejected
//! - **Agronomic advice** and **product recommendations** for every accepted diagnosis
//! - **Burn backends**: NdArray on the CPU, CUDA behind the `cuda` feature
//!
//! ## Modules
//!
//! - `labels`: Crop selector and ordered class label sets
//! - `model`: CNN architecture, configuration and weight files
//! - `inference`: Preprocessing, confidence gate and inference engine
//! - `advisory`: Class label to advice lookup
//! - `catalog`: Product catalog collaborator and matcher
//! - `service`: Per-crop diagnosis and response assembly
//! - `config`: Service configuration file
//! - `utils`: Error types and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cropsight::{backend, Crop, DiagnosisService, ServiceConfig};
//! use cropsight::service::load_catalog;
//!
//! let config = ServiceConfig::load("cropsight.json".as_ref())?;
//! let catalog = load_catalog(&config)?;
//! let service = DiagnosisService::<backend::InferenceBackend>::from_config(
//!     &config,
//!     Box::new(catalog),
//!     backend::default_device(),
//! )?;
//!
//! let response = service.diagnose(Crop::Potato, &std::fs::read("leaf.jpg")?)?;
//! println!("{} ({:.1}%)", response.disease_class, response.confidence);
//! ```

pub mod advisory;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod inference;
pub mod labels;
pub mod model;
pub mod service;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items for convenience
pub use advisory::AdvisoryTable;
pub use catalog::{InMemoryCatalog, ProductCatalog, ProductMatcher, RecommendedProduct};
pub use config::{CropConfig, ServiceConfig};
pub use inference::{ConfidenceGate, InferenceEngine, PredictionResult, Preprocessor};
pub use labels::{Crop, LabelSet};
pub use model::{Classifier, ClassifierConfig, DiseaseClassifier, ModelVariant};
pub use service::{DiagnosisService, PredictionResponse};
pub use utils::error::{CropSightError, Result};

/// Minimum top-1 confidence (percent) for a diagnosis to be returned
pub const CONFIDENCE_THRESHOLD: f32 = inference::DEFAULT_CONFIDENCE_THRESHOLD;

/// Default number of recommended products per diagnosis
pub const DEFAULT_PRODUCT_LIMIT: usize = catalog::DEFAULT_PRODUCT_LIMIT;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
