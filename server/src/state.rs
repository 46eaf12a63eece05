//! Application state for the CropSight server
//!
//! Every served crop gets its own diagnosis service behind its own lock, so a
//! request for one crop never waits on another crop's model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use cropsight::backend::{default_device, InferenceBackend};
use cropsight::service::load_catalog;
use cropsight::{Crop, CropSightError, DiagnosisService, ServiceConfig};

pub type CropService = Mutex<DiagnosisService<InferenceBackend>>;

/// Shared application state
pub struct AppState {
    /// One service per crop, loaded once at startup
    pub services: HashMap<Crop, CropService>,
    /// Configuration the services were built from
    pub config: ServiceConfig,
    /// Served crops, sorted
    pub crops: Vec<Crop>,
    /// Server start time
    pub started_at: Instant,
    pub started_at_utc: DateTime<Utc>,
}

impl AppState {
    /// Load every configured crop's model; any failure aborts startup
    pub fn from_config(config: ServiceConfig) -> cropsight::Result<Self> {
        config.validate()?;

        let catalog = load_catalog(&config)?;
        let device = default_device();

        let mut services = HashMap::new();
        for crop in config.crops.iter().map(|c| c.crop) {
            let single = config
                .only(crop)
                .ok_or_else(|| CropSightError::UnknownCrop(crop.to_string()))?;
            let service = DiagnosisService::<InferenceBackend>::from_config(
                &single,
                Box::new(catalog.clone()),
                device.clone(),
            )?;
            services.insert(crop, Mutex::new(service));
        }

        let mut crops: Vec<Crop> = services.keys().copied().collect();
        crops.sort();

        Ok(Self {
            services,
            config,
            crops,
            started_at: Instant::now(),
            started_at_utc: Utc::now(),
        })
    }

    /// Service for `crop`, or `UnknownCrop` when it is not served
    pub fn service(&self, crop: Crop) -> cropsight::Result<&CropService> {
        self.services
            .get(&crop)
            .ok_or_else(|| CropSightError::UnknownCrop(crop.to_string()))
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
