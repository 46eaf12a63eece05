//! Crop selector and class label sets
//!
//! A label set is the ordered index -> class name mapping a model was trained
//! with. Order and casing must match training exactly, so names are kept as
//! the training folders spelled them (`Healthy` for potato, `healthy` for
//! cotton).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ModelVariant;
use crate::utils::error::{CropSightError, Result};

/// Potato classes (3-class shallow model)
pub const POTATO_CLASSES: [&str; 3] = ["Early_Blight", "Healthy", "Late_Blight"];

/// Cotton classes
pub const COTTON_CLASSES: [&str; 4] = ["bacterial_blight", "curl_virus", "fussarium_wilt", "healthy"];

/// Wheat cereal-rust classes
pub const WHEAT_CLASSES: [&str; 3] = ["Brown_Rust", "Healthy", "Yellow_Rust"];

/// Crop served by its own model and label set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Potato,
    Cotton,
    Wheat,
}

impl Crop {
    /// All supported crops
    pub const ALL: [Crop; 3] = [Crop::Potato, Crop::Cotton, Crop::Wheat];

    /// Lowercase name used in routes and config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Crop::Potato => "potato",
            Crop::Cotton => "cotton",
            Crop::Wheat => "wheat",
        }
    }

    /// Label set the stock weights for this crop were trained with
    pub fn default_labels(&self) -> LabelSet {
        match self {
            Crop::Potato => LabelSet::from_names(&POTATO_CLASSES),
            Crop::Cotton => LabelSet::from_names(&COTTON_CLASSES),
            Crop::Wheat => LabelSet::from_names(&WHEAT_CLASSES),
        }
    }

    /// Architecture the stock weights for this crop use
    pub fn default_variant(&self) -> ModelVariant {
        match self {
            Crop::Potato => ModelVariant::Shallow,
            Crop::Cotton | Crop::Wheat => ModelVariant::Deep,
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Crop {
    type Err = CropSightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "potato" => Ok(Crop::Potato),
            "cotton" => Ok(Crop::Cotton),
            "wheat" => Ok(Crop::Wheat),
            other => Err(CropSightError::UnknownCrop(other.to_string())),
        }
    }
}

/// Ordered class names of one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Build a label set; the slice order is the class index order
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn from_names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|name| name.to_string()).collect())
    }

    /// Class name for a model output index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of a class name (exact, case-sensitive match)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Reject empty sets and duplicate names
    pub fn validate(&self) -> Result<()> {
        if self.names.is_empty() {
            return Err(CropSightError::Config("label set is empty".to_string()));
        }
        for (i, name) in self.names.iter().enumerate() {
            if name.is_empty() {
                return Err(CropSightError::Config(format!("label {} is empty", i)));
            }
            if self.names[..i].contains(name) {
                return Err(CropSightError::Config(format!("duplicate label '{}'", name)));
            }
        }
        Ok(())
    }
}
