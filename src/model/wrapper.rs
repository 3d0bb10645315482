//! Lazy, thread-safe ownership of the resolved predictor.

use super::loader::{self, ModelHandle};
use super::output::{RawOutput, TensorData};
use crate::Result;
use ndarray::Array4;
use ort::session::SessionOutputs;
use ort::value::Tensor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

// Named bindings retried when the resolved input key is rejected.
const FALLBACK_INPUT_KEYS: [&str; 5] = ["input_1", "input", "image", "images", "x"];

#[derive(Debug)]
struct LoadedPredictor {
    handle: ModelHandle,
    input_key: Option<String>,
}

/// Wraps model resolution and inference with lazy initialization.
///
/// Resolution happens at most once, on first use, even under concurrent
/// first requests: the initialized flag is checked, the lock acquired, the
/// flag re-checked, and only then does resolution run. A resolution failure
/// is recorded rather than retried; the service then answers with mock
/// predictions instead of failing every request.
#[derive(Debug)]
pub struct ModelWrapper {
    model_path: PathBuf,
    onnx_threads: usize,
    loaded: AtomicBool,
    predictor: Mutex<Option<LoadedPredictor>>,
}

impl ModelWrapper {
    pub fn new(model_path: impl Into<PathBuf>, onnx_threads: usize) -> Self {
        Self {
            model_path: model_path.into(),
            onnx_threads,
            loaded: AtomicBool::new(false),
            predictor: Mutex::new(None),
        }
    }

    async fn ensure_loaded(&self) {
        if self.loaded.load(Ordering::Acquire) {
            return;
        }

        let mut guard = self.predictor.lock().await;
        if self.loaded.load(Ordering::Acquire) {
            return;
        }

        match loader::resolve_model(&self.model_path, self.onnx_threads) {
            Ok(handle) => {
                let input_key = loader::resolve_input_key(&handle);
                info!("Model ready from {}", self.model_path.display());
                *guard = Some(LoadedPredictor { handle, input_key });
            }
            Err(e) => {
                error!("Model load failed, running in mock prediction mode: {}", e);
                *guard = None;
            }
        }

        self.loaded.store(true, Ordering::Release);
    }

    /// Runs inference on a preprocessed single-item batch.
    ///
    /// Returns `None` when no model could be resolved (mock mode).
    pub async fn predict(&self, input: &Array4<f32>) -> Result<Option<RawOutput>> {
        self.ensure_loaded().await;

        let mut guard = self.predictor.lock().await;
        match guard.as_mut() {
            Some(predictor) => predictor.run(input).map(Some),
            None => {
                debug!("Model not available, returning mock predictions");
                Ok(None)
            }
        }
    }

    pub async fn is_available(&self) -> bool {
        self.ensure_loaded().await;
        self.predictor.lock().await.is_some()
    }
}

impl LoadedPredictor {
    fn run(&mut self, input: &Array4<f32>) -> Result<RawOutput> {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let data: Vec<f32> = input.iter().copied().collect();

        match &mut self.handle {
            ModelHandle::Direct { session, .. } => {
                let input_name = session
                    .inputs
                    .first()
                    .map(|i| i.name.clone())
                    .unwrap_or_else(|| "input".to_string());
                let tensor = Tensor::from_array((shape, data))?;
                let outputs = session.run(ort::inputs![input_name.as_str() => tensor])?;
                opaque_output(&outputs)
            }
            ModelHandle::Signature { session, .. } => {
                let resolved = self
                    .input_key
                    .clone()
                    .unwrap_or_else(|| "inputs".to_string());

                // Resolved key first, then the fixed fallback list; a
                // rejected binding name is retried, not fatal.
                let mut keys: Vec<String> = vec![resolved];
                keys.extend(FALLBACK_INPUT_KEYS.iter().map(|k| k.to_string()));

                for key in &keys {
                    let tensor = Tensor::from_array((shape.clone(), data.clone()))?;
                    match session.run(ort::inputs![key.as_str() => tensor]) {
                        Ok(outputs) => return named_outputs(&outputs),
                        Err(e) => debug!("Input binding '{}' rejected: {}", key, e),
                    }
                }

                // Positional fallback: the session's first declared input.
                let positional = session
                    .inputs
                    .first()
                    .map(|i| i.name.clone())
                    .unwrap_or_else(|| "inputs".to_string());
                let tensor = Tensor::from_array((shape, data))?;
                let outputs = session.run(ort::inputs![positional.as_str() => tensor])?;
                named_outputs(&outputs)
            }
        }
    }
}

/// A direct graph's prediction: the first output as an opaque tensor.
fn opaque_output(outputs: &SessionOutputs) -> Result<RawOutput> {
    for (_, value) in outputs.iter() {
        if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
            return Ok(RawOutput::Tensor(TensorData {
                shape: shape.iter().copied().collect(),
                data: data.to_vec(),
            }));
        }
    }
    Err(crate::Error::unsupported_output(
        "model produced no float tensor output",
    ))
}

/// A signature graph's prediction: every float output, in declared order.
fn named_outputs(outputs: &SessionOutputs) -> Result<RawOutput> {
    let mut entries = Vec::new();
    for (name, value) in outputs.iter() {
        match value.try_extract_tensor::<f32>() {
            Ok((shape, data)) => entries.push((
                name.to_string(),
                TensorData {
                    shape: shape.iter().copied().collect(),
                    data: data.to_vec(),
                },
            )),
            Err(e) => debug!("Skipping non-float output '{}': {}", name, e),
        }
    }

    if entries.is_empty() {
        return Err(crate::Error::unsupported_output(
            "model produced no float tensor output",
        ));
    }
    Ok(RawOutput::Named(entries))
}
