//! Inference Engine
//!
//! Preprocess -> forward pass -> softmax -> top-1 -> confidence gate.
//! An engine owns one loaded model, its label set and the device chosen for
//! it at construction. `predict` takes `&self` and keeps no per-call state, so
//! each request gets its own input tensor and forward pass.

use std::path::Path;
use std::time::{Duration, Instant};

use burn::tensor::{activation::softmax, backend::Backend};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::preprocess::{PreprocessedImage, Preprocessor};
use crate::labels::LabelSet;
use crate::model::{Classifier, ClassifierConfig, DiseaseClassifier};
use crate::utils::error::{CropSightError, Result};

/// Minimum top-1 confidence (percent) for a prediction to be returned
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 75.0;

/// Rejects predictions whose confidence is below the threshold
///
/// Accepts when `confidence >= threshold`, so a confidence equal to the
/// threshold passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl ConfidenceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn check(&self, confidence: f32) -> Result<()> {
        // NaN never passes
        if confidence >= self.threshold {
            Ok(())
        } else {
            Err(CropSightError::LowConfidence {
                confidence,
                threshold: self.threshold,
            })
        }
    }
}

/// Index and probability of the most likely class
pub fn top1(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}

/// Result of a single accepted prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class name, exactly as spelled in the label set
    pub predicted_class: String,

    /// Predicted class index
    pub class_index: usize,

    /// Top-1 probability as a percentage in [0, 100]
    pub confidence: f32,

    /// Full softmax distribution, in label-set order
    pub probabilities: Vec<f32>,

    /// Forward pass time in milliseconds
    pub inference_time_ms: f64,
}

impl PredictionResult {
    /// Pick the top-1 class from a probability distribution
    pub fn from_probabilities(
        probabilities: Vec<f32>,
        labels: &LabelSet,
        inference_time: Duration,
    ) -> Result<Self> {
        if probabilities.len() != labels.len() {
            return Err(CropSightError::Inference(format!(
                "model produced {} scores for {} labels",
                probabilities.len(),
                labels.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(CropSightError::Inference(
                "model produced non-finite probabilities".to_string(),
            ));
        }

        let (class_index, probability) = top1(&probabilities)
            .ok_or_else(|| CropSightError::Inference("empty probability vector".to_string()))?;

        let predicted_class = labels
            .name(class_index)
            .ok_or_else(|| CropSightError::Inference(format!("no label for class {}", class_index)))?
            .to_string();

        Ok(Self {
            predicted_class,
            class_index,
            confidence: (probability * 100.0).clamp(0.0, 100.0),
            probabilities,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }
}

/// Runs one crop's model over uploaded images
pub struct InferenceEngine<B: Backend, M: Classifier<B> = DiseaseClassifier<B>> {
    model: M,
    labels: LabelSet,
    device: B::Device,
    preprocessor: Preprocessor,
    gate: ConfidenceGate,
}

impl<B: Backend> InferenceEngine<B> {
    /// Load weights from disk and build an engine around them
    pub fn load(
        weights_path: &Path,
        config: &ClassifierConfig,
        labels: LabelSet,
        device: B::Device,
    ) -> Result<Self> {
        let model = DiseaseClassifier::load(weights_path, config, &device)?;
        Self::new(model, labels, device)
    }
}

impl<B: Backend, M: Classifier<B>> InferenceEngine<B, M> {
    /// Wrap a model; its class count must match the label set
    pub fn new(model: M, labels: LabelSet, device: B::Device) -> Result<Self> {
        if model.num_classes() != labels.len() {
            return Err(CropSightError::ModelLoad(format!(
                "model has {} classes but the label set has {}",
                model.num_classes(),
                labels.len()
            )));
        }

        Ok(Self {
            model,
            labels,
            device,
            preprocessor: Preprocessor::default(),
            gate: ConfidenceGate::default(),
        })
    }

    /// Configure the preprocessing (input resolution)
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Configure the acceptance threshold (percent)
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.gate = ConfidenceGate::new(threshold);
        self
    }

    /// Classify an uploaded image
    ///
    /// Errors:
    /// * [`CropSightError::ImageDecode`] - bytes are not an image; the model is not run
    /// * [`CropSightError::LowConfidence`] - top-1 confidence below the threshold
    pub fn predict(&self, image_bytes: &[u8]) -> Result<PredictionResult> {
        let input = self.preprocessor.preprocess(image_bytes)?;

        let start = Instant::now();
        let probabilities = self.probabilities(input)?;
        let elapsed = start.elapsed();

        let result = PredictionResult::from_probabilities(probabilities, &self.labels, elapsed)?;
        debug!(
            "{} ({:.2}%) in {:.2} ms",
            result.predicted_class, result.confidence, result.inference_time_ms
        );

        if let Err(err) = self.gate.check(result.confidence) {
            info!(
                "Rejected prediction {} at {:.2}% (threshold {:.2}%)",
                result.predicted_class,
                result.confidence,
                self.gate.threshold()
            );
            return Err(err);
        }

        Ok(result)
    }

    /// Softmax distribution for a preprocessed image
    pub fn probabilities(&self, input: PreprocessedImage) -> Result<Vec<f32>> {
        let tensor = input.into_tensor::<B>(&self.device);
        let logits = self.model.logits(tensor);
        let probabilities = softmax(logits, 1);

        probabilities
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| CropSightError::Inference(format!("failed to read probabilities: {:?}", e)))
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn threshold(&self) -> f32 {
        self.gate.threshold()
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::Crop;
    use crate::model::ModelVariant;
    use crate::testing::{png_bytes, FixedLogits};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn stub_engine(stub: FixedLogits) -> InferenceEngine<TestBackend, FixedLogits> {
        InferenceEngine::<TestBackend, FixedLogits>::new(
            stub,
            Crop::Potato.default_labels(),
            Default::default(),
        )
        .unwrap()
        .with_preprocessor(Preprocessor::new(16))
    }

    #[test]
    fn test_gate_boundary() {
        let gate = ConfidenceGate::new(75.0);
        assert!(gate.check(75.0).is_ok());
        assert!(gate.check(99.9).is_ok());
        assert!(matches!(
            gate.check(74.999),
            Err(CropSightError::LowConfidence { .. })
        ));
        assert!(gate.check(f32::NAN).is_err());
    }

    #[test]
    fn test_top1() {
        assert_eq!(top1(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(top1(&[]), None);
    }

    #[test]
    fn test_result_from_probabilities() {
        let labels = Crop::Potato.default_labels();
        let result =
            PredictionResult::from_probabilities(vec![0.05, 0.9, 0.05], &labels, Duration::from_millis(4))
                .unwrap();

        assert_eq!(result.predicted_class, "Healthy");
        assert_eq!(result.class_index, 1);
        assert!((result.confidence - 90.0).abs() < 1e-4);
        assert!((result.inference_time_ms - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_result_rejects_length_mismatch_and_nan() {
        let labels = Crop::Potato.default_labels();
        assert!(PredictionResult::from_probabilities(vec![1.0], &labels, Duration::ZERO).is_err());
        assert!(
            PredictionResult::from_probabilities(vec![f32::NAN, 0.5, 0.5], &labels, Duration::ZERO)
                .is_err()
        );
    }

    #[test]
    fn test_confident_prediction_is_accepted() {
        let engine = stub_engine(FixedLogits::new(&[0.0, 5.0, 0.0]));
        let result = engine.predict(&png_bytes(40, 30, [30, 160, 40])).unwrap();

        assert_eq!(result.predicted_class, "Healthy");
        assert!(result.confidence >= 75.0 && result.confidence <= 100.0);

        let total: f32 = result.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ambiguous_prediction_is_rejected() {
        let engine = stub_engine(FixedLogits::with_top_probability(3, 2, 0.6));
        let err = engine.predict(&png_bytes(8, 8, [90, 90, 90])).unwrap_err();

        match err {
            CropSightError::LowConfidence { confidence, threshold } => {
                assert!((confidence - 60.0).abs() < 1e-3);
                assert_eq!(threshold, 75.0);
            }
            other => panic!("expected LowConfidence, got {:?}", other),
        }
    }

    #[test]
    fn test_prediction_at_threshold_is_accepted() {
        let engine = stub_engine(FixedLogits::with_top_probability(3, 1, 0.75));
        let result = engine.predict(&png_bytes(8, 8, [60, 150, 60])).unwrap();

        assert_eq!(result.predicted_class, "Healthy");
        assert!((result.confidence - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_custom_threshold() {
        let engine = stub_engine(FixedLogits::with_top_probability(3, 0, 0.6)).with_threshold(50.0);
        let result = engine.predict(&png_bytes(8, 8, [90, 90, 90])).unwrap();
        assert_eq!(result.predicted_class, "Early_Blight");
        assert_eq!(engine.threshold(), 50.0);
    }

    #[test]
    fn test_undecodable_image_skips_model() {
        let engine = stub_engine(FixedLogits::new(&[0.0, 5.0, 0.0]));
        let err = engine.predict(b"\x89PNG garbage").unwrap_err();

        assert!(matches!(err, CropSightError::ImageDecode(_)));
        assert_eq!(engine.model().calls(), 0);
    }

    #[test]
    fn test_label_count_must_match_model() {
        let result = InferenceEngine::<TestBackend, FixedLogits>::new(
            FixedLogits::new(&[0.0, 1.0]),
            Crop::Potato.default_labels(),
            Default::default(),
        );
        assert!(matches!(result, Err(CropSightError::ModelLoad(_))));
    }

    #[test]
    fn test_real_model_is_deterministic_and_in_label_set() {
        let device = Default::default();
        let config = ClassifierConfig::new(ModelVariant::Shallow, 3);
        let model = DiseaseClassifier::<TestBackend>::new(&config, &device);
        let engine = InferenceEngine::<TestBackend>::new(model, Crop::Potato.default_labels(), device)
            .unwrap()
            .with_preprocessor(Preprocessor::new(32))
            .with_threshold(0.0);

        let image = png_bytes(50, 70, [120, 180, 60]);
        let first = engine.predict(&image).unwrap();
        let second = engine.predict(&image).unwrap();

        assert_eq!(first.predicted_class, second.predicted_class);
        assert_eq!(first.probabilities, second.probabilities);
        assert!(engine.labels().contains(&first.predicted_class));
        assert!((0.0..=100.0).contains(&first.confidence));

        let total: f32 = first.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_load_missing_weights() {
        let config = ClassifierConfig::new(ModelVariant::Shallow, 3);
        let result = InferenceEngine::<TestBackend>::load(
            Path::new("/nonexistent/weights/potato"),
            &config,
            Crop::Potato.default_labels(),
            Default::default(),
        );
        assert!(matches!(result, Err(CropSightError::ModelLoad(_))));
    }
}
