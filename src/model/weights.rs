//! Weight file loading and saving
//!
//! Weights are stored with Burn's `CompactRecorder` (named MessagePack, half
//! precision). The recorder appends the `.mpk` extension itself, so paths may
//! be given with or without it.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::Backend;
use tracing::{debug, info};

use super::cnn::{DiseaseClassifier, DiseaseClassifierRecord};
use super::config::ClassifierConfig;
use crate::utils::error::{CropSightError, Result};

/// Extension the compact recorder writes
pub const WEIGHTS_EXTENSION: &str = "mpk";

/// Path the recorder actually reads or writes for `path`
pub fn weights_file(path: &Path) -> PathBuf {
    path.with_extension(WEIGHTS_EXTENSION)
}

impl<B: Backend> DiseaseClassifier<B> {
    /// Load trained weights for the architecture described by `config`
    ///
    /// Fails with [`CropSightError::ModelLoad`] when the file is missing or
    /// unreadable, or when any stored parameter shape differs from the
    /// architecture built for `config` (wrong variant or class count).
    pub fn load(weights_path: &Path, config: &ClassifierConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;

        let file = weights_file(weights_path);
        if !file.is_file() {
            return Err(CropSightError::ModelLoad(format!(
                "weights file not found: {}",
                file.display()
            )));
        }

        let fresh = DiseaseClassifier::<B>::new(config, device);
        let expected = fresh.parameter_shapes();

        let record: DiseaseClassifierRecord<B> = CompactRecorder::new()
            .load(file.clone(), device)
            .map_err(|e| {
                CropSightError::ModelLoad(format!("failed to read {}: {:?}", file.display(), e))
            })?;

        let found = record_shapes(&record);
        if found.len() != expected.len() {
            return Err(CropSightError::ModelLoad(format!(
                "{} holds {} weight tensors, expected {}",
                file.display(),
                found.len(),
                expected.len()
            )));
        }

        for ((name, want), (_, got)) in expected.iter().zip(found.iter()) {
            if want != got {
                return Err(CropSightError::ModelLoad(format!(
                    "parameter '{}' in {} has shape {:?}, expected {:?} for a {} model with {} classes",
                    name,
                    file.display(),
                    got,
                    want,
                    config.variant,
                    config.num_classes
                )));
            }
            debug!("{} {:?}", name, got);
        }

        let model = fresh.load_record(record);

        info!(
            "Loaded {} model ({} classes) from {}",
            config.variant,
            config.num_classes,
            file.display()
        );

        Ok(model)
    }

    /// Write the current weights, creating parent directories as needed
    pub fn save(&self, weights_path: &Path) -> Result<PathBuf> {
        let file = weights_file(weights_path);
        if let Some(parent) = file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        self.clone()
            .save_file(file.clone(), &CompactRecorder::new())
            .map_err(|e| {
                CropSightError::Serialization(format!(
                    "failed to write {}: {:?}",
                    file.display(),
                    e
                ))
            })?;

        info!("Saved weights to {}", file.display());
        Ok(file)
    }
}

/// Parameter shapes stored in a record, in the order of
/// [`DiseaseClassifier::parameter_shapes`]
fn record_shapes<B: Backend>(record: &DiseaseClassifierRecord<B>) -> Vec<(String, Vec<usize>)> {
    let mut shapes = Vec::with_capacity(record.blocks.len() * 2 + 3);

    for (i, block) in record.blocks.iter().enumerate() {
        shapes.push((
            format!("blocks.{}.conv.weight", i),
            block.conv.weight.val().dims().to_vec(),
        ));
        shapes.push((
            format!("blocks.{}.bn.gamma", i),
            block.bn.gamma.val().dims().to_vec(),
        ));
    }

    shapes.push(("fc1.weight".to_string(), record.fc1.weight.val().dims().to_vec()));
    shapes.push(("fc_bn.gamma".to_string(), record.fc_bn.gamma.val().dims().to_vec()));
    shapes.push(("fc2.weight".to_string(), record.fc2.weight.val().dims().to_vec()));

    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelVariant;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn saved_model(dir: &Path, variant: ModelVariant, num_classes: usize) -> PathBuf {
        let device = Default::default();
        let config = ClassifierConfig::new(variant, num_classes);
        let model = DiseaseClassifier::<TestBackend>::new(&config, &device);
        let path = dir.join(format!("{}_{}", variant, num_classes));
        model.save(&path).unwrap();
        path
    }

    #[test]
    fn test_weights_file_extension() {
        assert_eq!(weights_file(Path::new("w/potato")), PathBuf::from("w/potato.mpk"));
        assert_eq!(weights_file(Path::new("w/potato.mpk")), PathBuf::from("w/potato.mpk"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_model(dir.path(), ModelVariant::Shallow, 3);
        assert!(weights_file(&path).is_file());

        let device = Default::default();
        let config = ClassifierConfig::new(ModelVariant::Shallow, 3);
        let model = DiseaseClassifier::<TestBackend>::load(&path, &config, &device).unwrap();

        let output = model.forward(Tensor::zeros([1, 3, 32, 32], &device));
        assert_eq!(output.dims(), [1, 3]);
    }

    #[test]
    fn test_missing_file_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = ClassifierConfig::new(ModelVariant::Shallow, 3);

        let result = DiseaseClassifier::<TestBackend>::load(&dir.path().join("absent"), &config, &device);
        assert!(matches!(result, Err(CropSightError::ModelLoad(_))));
    }

    #[test]
    fn test_class_count_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_model(dir.path(), ModelVariant::Shallow, 3);

        let device = Default::default();
        let config = ClassifierConfig::new(ModelVariant::Shallow, 4);
        let result = DiseaseClassifier::<TestBackend>::load(&path, &config, &device);

        match result {
            Err(CropSightError::ModelLoad(message)) => assert!(message.contains("fc2.weight")),
            other => panic!("expected ModelLoad error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_variant_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_model(dir.path(), ModelVariant::Shallow, 3);

        let device = Default::default();
        let config = ClassifierConfig::new(ModelVariant::Deep, 3);
        let result = DiseaseClassifier::<TestBackend>::load(&path, &config, &device);

        assert!(matches!(result, Err(CropSightError::ModelLoad(_))));
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt");
        std::fs::write(weights_file(&path), b"definitely not messagepack").unwrap();

        let device = Default::default();
        let config = ClassifierConfig::new(ModelVariant::Shallow, 3);
        let result = DiseaseClassifier::<TestBackend>::load(&path, &config, &device);

        assert!(matches!(result, Err(CropSightError::ModelLoad(_))));
    }
}
