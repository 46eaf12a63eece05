//! Product catalog and matcher
//!
//! The catalog is an external collaborator: the pipeline only asks it for
//! products in the category named after the predicted class. `InMemoryCatalog`
//! serves a JSON product list, which is what the CLI and server use.

use std::path::Path;

use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::utils::error::{CropSightError, Result};

/// Default number of products attached to a response
pub const DEFAULT_PRODUCT_LIMIT: usize = 10;

/// A catalog product recommended alongside a diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub name: String,
    pub price: f64,
    pub description: String,
    #[serde(alias = "image")]
    pub image_url: String,
    /// Category name; equals the class label the product treats
    pub category: String,
}

/// Product lookup capability
pub trait ProductCatalog {
    /// Up to `limit` products whose category equals `category`, in any order
    fn find_products(&self, category: &str, limit: usize) -> Result<Vec<RecommendedProduct>>;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<RecommendedProduct>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<RecommendedProduct>) -> Self {
        Self { products }
    }

    /// Load a JSON array of products
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CropSightError::Catalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        let products: Vec<RecommendedProduct> = serde_json::from_str(&json).map_err(|e| {
            CropSightError::Catalog(format!("invalid catalog {}: {}", path.display(), e))
        })?;

        debug!("Loaded {} products from {}", products.len(), path.display());
        Ok(Self::new(products))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn find_products(&self, category: &str, limit: usize) -> Result<Vec<RecommendedProduct>> {
        let mut matches: Vec<&RecommendedProduct> =
            self.products.iter().filter(|p| p.category == category).collect();

        matches.shuffle(&mut thread_rng());

        Ok(matches.into_iter().take(limit).cloned().collect())
    }
}

/// Finds products for a predicted class
pub struct ProductMatcher {
    catalog: Box<dyn ProductCatalog + Send + Sync>,
    limit: usize,
}

impl ProductMatcher {
    pub fn new(catalog: Box<dyn ProductCatalog + Send + Sync>, limit: usize) -> Self {
        Self { catalog, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Products for `label`; lookup failures degrade to an empty list
    pub fn find_matches(&self, label: &str) -> Vec<RecommendedProduct> {
        match self.catalog.find_products(label, self.limit) {
            Ok(products) => products,
            Err(e) => {
                warn!("Product lookup for '{}' failed: {}", label, e);
                Vec::new()
            }
        }
    }
}
