//! Prediction orchestration: validation → preprocessing → inference →
//! normalization → formatting.

use crate::config::ModelConfig;
use crate::imaging::{self, PreprocessMode};
use crate::labels;
use crate::model::{self, ModelWrapper};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

const USER_FACING_ERROR: &str = "Error analyzing image. Please try again.";

/// Stages a single request moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineStage {
    Validating,
    Preprocessing,
    Inferring,
    Normalizing,
    Formatting,
}

/// Successful classification of one image.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub success: bool,
    pub predictions: BTreeMap<String, f32>,
    pub top_prediction: String,
    pub confidence: f32,
}

/// Failure record returned instead of propagating internal faults.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionFailure {
    pub success: bool,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Success(PredictionReport),
    Failure(PredictionFailure),
}

impl PredictionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictionOutcome::Success(_))
    }
}

/// Owns the resolved class names, the lazily resolved model and the
/// preprocess mode; shared read-only by request handlers.
#[derive(Debug)]
pub struct PredictionService {
    class_names: Vec<String>,
    model: ModelWrapper,
    preprocess_mode: PreprocessMode,
}

impl PredictionService {
    /// Builds the service. Class names are resolved eagerly (a service
    /// without labels cannot format any prediction); the model itself is
    /// resolved on first use.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let class_names =
            labels::resolve_class_names(&config.class_indices_path, &config.labels_txt_path)?;
        info!("Resolved {} class names", class_names.len());

        Ok(Self {
            class_names,
            model: ModelWrapper::new(&config.model_path, config.onnx_threads),
            preprocess_mode: config.preprocess_mode,
        })
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub async fn model_available(&self) -> bool {
        self.model.is_available().await
    }

    /// Runs the full pipeline for one uploaded image.
    ///
    /// Every failure is caught here and converted into a structured failure
    /// record; internal detail is logged, the caller sees a short error
    /// string and a fixed user-facing message.
    pub async fn predict(&self, image_data: &[u8]) -> PredictionOutcome {
        match self.run_pipeline(image_data).await {
            Ok(report) => PredictionOutcome::Success(report),
            Err(e) => {
                error!("Prediction error: {}", e);
                PredictionOutcome::Failure(PredictionFailure {
                    success: false,
                    error: e.to_string(),
                    message: USER_FACING_ERROR.to_string(),
                })
            }
        }
    }

    async fn run_pipeline(&self, image_data: &[u8]) -> Result<PredictionReport> {
        self.enter(PipelineStage::Validating);
        if image_data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if !imaging::validate_image(image_data) {
            return Err(Error::invalid_image("Invalid image format"));
        }

        self.enter(PipelineStage::Preprocessing);
        let input = imaging::preprocess_image(image_data, self.preprocess_mode)?;

        self.enter(PipelineStage::Inferring);
        let raw = self.model.predict(&input).await?;

        self.enter(PipelineStage::Normalizing);
        let probabilities = match raw {
            Some(raw) => model::extract_probabilities(raw)?,
            None => uniform_probabilities(self.class_names.len()),
        };

        self.enter(PipelineStage::Formatting);
        self.format_report(&probabilities)
    }

    fn enter(&self, stage: PipelineStage) {
        debug!("Pipeline stage: {:?}", stage);
    }

    /// Aligns the probability vector 1:1 with class order and picks the
    /// argmax. A vector longer than the class list cannot be labelled and
    /// is an error; a shorter one simply yields fewer entries.
    fn format_report(&self, probabilities: &[f32]) -> Result<PredictionReport> {
        if probabilities.is_empty() {
            return Err(Error::prediction("empty probability vector"));
        }
        if probabilities.len() > self.class_names.len() {
            return Err(Error::prediction(format!(
                "prediction vector has {} entries but only {} class names are known",
                probabilities.len(),
                self.class_names.len()
            )));
        }

        let mut predictions = BTreeMap::new();
        for (index, &probability) in probabilities.iter().enumerate() {
            predictions.insert(self.class_names[index].clone(), probability);
        }

        let (top_index, confidence) = probabilities.iter().copied().enumerate().fold(
            (0, f32::NEG_INFINITY),
            |best, (index, probability)| {
                if probability > best.1 {
                    (index, probability)
                } else {
                    best
                }
            },
        );

        Ok(PredictionReport {
            success: true,
            predictions,
            top_prediction: self.class_names[top_index].clone(),
            confidence,
        })
    }
}

/// Uniform distribution substituted when no model could be resolved; length
/// falls back to 2 when the class list is empty.
fn uniform_probabilities(class_count: usize) -> Vec<f32> {
    let size = if class_count == 0 { 2 } else { class_count };
    vec![1.0 / size as f32; size]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_distribution_sums_to_one() {
        let probs = uniform_probabilities(7);
        assert_eq!(probs.len(), 7);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_distribution_defaults_to_two_entries() {
        assert_eq!(uniform_probabilities(0).len(), 2);
    }
}
