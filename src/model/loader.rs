//! Model resolution across the persisted formats a training run may have
//! produced.
//!
//! Training exports have shipped in four different layouts over the life of
//! the project. Resolution walks an ordered list of attempt loaders and
//! short-circuits on the first success; a failing strategy is logged and the
//! chain continues, so one corrupt side-file cannot mask a loadable format
//! further down the list.

use crate::{Error, Result};
use ort::session::{Session, builder::GraphOptimizationLevel};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parameters of the fixed trained topology (feature extractor →
/// global-average-pool → dropout → dense(relu) → dropout → dense(softmax)),
/// read from `model_architecture.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureSpec {
    #[serde(default = "default_input_shape")]
    pub input_shape: Vec<i64>,
    #[serde(default)]
    pub base_trainable: bool,
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f32,
    #[serde(default = "default_dense_units")]
    pub dense_units: usize,
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
}

fn default_input_shape() -> Vec<i64> {
    vec![224, 224, 3]
}

fn default_dropout_rate() -> f32 {
    0.2
}

fn default_dense_units() -> usize {
    128
}

fn default_num_classes() -> usize {
    2
}

/// One named entry point of an exported serving graph.
#[derive(Debug, Clone, Deserialize)]
pub struct ServingSignature {
    #[serde(default)]
    pub inputs: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub outputs: BTreeMap<String, serde_json::Value>,
}

/// A loaded predictor.
///
/// Two shapes exist: a direct graph whose input is bound positionally, and a
/// serving-signature graph whose inputs are bound by name.
pub enum ModelHandle {
    Direct {
        session: Session,
        architecture: Option<ArchitectureSpec>,
    },
    Signature {
        session: Session,
        signature: ServingSignature,
    },
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelHandle::Direct { architecture, .. } => f
                .debug_struct("Direct")
                .field("architecture", architecture)
                .finish_non_exhaustive(),
            ModelHandle::Signature { signature, .. } => f
                .debug_struct("Signature")
                .field("signature", signature)
                .finish_non_exhaustive(),
        }
    }
}

type StrategyFn = fn(&Path, usize) -> Result<Option<ModelHandle>>;

// Ordered: first success wins. Ok(None) means the layout is not present.
const STRATEGIES: [(&str, StrategyFn); 4] = [
    ("bundle", load_bundle),
    ("architecture_weights", load_architecture_weights),
    ("config_weights", load_config_weights),
    ("serving_graph", load_serving_graph),
];

/// Resolves a predictor from `model_path`, trying each persisted format in
/// order. Fails only when every strategy has been exhausted.
pub fn resolve_model(model_path: &Path, onnx_threads: usize) -> Result<ModelHandle> {
    for (name, strategy) in STRATEGIES {
        match strategy(model_path, onnx_threads) {
            Ok(Some(handle)) => {
                info!(
                    "Model loaded from {} via '{}' strategy",
                    model_path.display(),
                    name
                );
                return Ok(handle);
            }
            Ok(None) => debug!("Model load strategy '{}' not applicable", name),
            Err(e) => warn!("Model load strategy '{}' failed: {}", name, e),
        }
    }

    Err(Error::model_load(format!(
        "all load strategies exhausted for {}",
        model_path.display()
    )))
}

/// Resolves how the handle's input is bound.
///
/// A direct graph binds positionally (`None`). A signature graph binds by
/// name: the lexicographically first declared input key, or `"inputs"` when
/// the signature declares none.
pub fn resolve_input_key(handle: &ModelHandle) -> Option<String> {
    match handle {
        ModelHandle::Direct { .. } => None,
        ModelHandle::Signature { signature, .. } => Some(
            signature
                .inputs
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| "inputs".to_string()),
        ),
    }
}

/// Strategy 1: a complete self-describing graph. `model_path` is itself an
/// `.onnx` file, or a directory containing `model.onnx`.
fn load_bundle(model_path: &Path, onnx_threads: usize) -> Result<Option<ModelHandle>> {
    let graph_path = if model_path.is_file() {
        model_path.to_path_buf()
    } else {
        let candidate = model_path.join("model.onnx");
        if !candidate.exists() {
            return Ok(None);
        }
        candidate
    };

    let session = build_session(&graph_path, onnx_threads)?;
    Ok(Some(ModelHandle::Direct {
        session,
        architecture: None,
    }))
}

/// Strategy 2: an architecture side-file plus a separate weights graph. The
/// architecture JSON parameterizes the fixed trained topology; the weights
/// graph carries the actual network.
fn load_architecture_weights(model_path: &Path, onnx_threads: usize) -> Result<Option<ModelHandle>> {
    let arch_path = model_path.join("model_architecture.json");
    let weights_path = model_path.join("model_weights.onnx");
    if !arch_path.exists() || !weights_path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&arch_path)?;
    let architecture: ArchitectureSpec = serde_json::from_str(&raw)?;
    debug!(
        "Architecture: input_shape={:?}, base_trainable={}, dropout_rate={}, dense_units={}, num_classes={}",
        architecture.input_shape,
        architecture.base_trainable,
        architecture.dropout_rate,
        architecture.dense_units,
        architecture.num_classes
    );

    let session = build_session(&weights_path, onnx_threads)?;
    Ok(Some(ModelHandle::Direct {
        session,
        architecture: Some(architecture),
    }))
}

/// Strategy 3: a structure description in `config.json` plus a separate
/// `weights.onnx`. The structure JSON is only required to be a JSON object;
/// the weights graph is authoritative.
fn load_config_weights(model_path: &Path, onnx_threads: usize) -> Result<Option<ModelHandle>> {
    let config_path = model_path.join("config.json");
    if !config_path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&config_path)?;
    let structure: serde_json::Value = serde_json::from_str(&raw)?;
    if !structure.is_object() {
        return Err(Error::model_load("config.json is not a JSON object"));
    }

    let session = build_session(&model_path.join("weights.onnx"), onnx_threads)?;
    Ok(Some(ModelHandle::Direct {
        session,
        architecture: None,
    }))
}

/// Strategy 4: an exported serving bundle, `saved_model.onnx` plus a
/// `signatures.json` naming the entry points. A bundle without a
/// `serving_default` signature is a hard failure for this strategy.
fn load_serving_graph(model_path: &Path, onnx_threads: usize) -> Result<Option<ModelHandle>> {
    let graph_path = model_path.join("saved_model.onnx");
    if !graph_path.exists() {
        return Ok(None);
    }

    let signatures = read_signatures(&model_path.join("signatures.json"))?;
    let signature = signatures
        .get("serving_default")
        .cloned()
        .ok_or_else(|| Error::model_load("No serving signature found"))?;

    let session = build_session(&graph_path, onnx_threads)?;
    Ok(Some(ModelHandle::Signature { session, signature }))
}

fn read_signatures(path: &Path) -> Result<BTreeMap<String, ServingSignature>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn build_session(graph_path: &Path, onnx_threads: usize) -> Result<Session> {
    ort::init().commit()?;
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(onnx_threads)?
        .commit_from_file(graph_path)
        .map_err(|e| {
            Error::model_load(format!(
                "failed to create session from {}: {}",
                graph_path.display(),
                e
            ))
        })?;
    Ok(session)
}
