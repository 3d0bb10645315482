use crate::imaging::PreprocessMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_class_indices_path")]
    pub class_indices_path: PathBuf,
    #[serde(default = "default_labels_txt_path")]
    pub labels_txt_path: PathBuf,
    #[serde(default)]
    pub preprocess_mode: PreprocessMode,
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_upload_bytes: default_max_upload_bytes(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            class_indices_path: default_class_indices_path(),
            labels_txt_path: default_labels_txt_path(),
            preprocess_mode: PreprocessMode::default(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

// Local development origins served by the frontend dev server.
fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost",
        "http://localhost:3000",
        "http://localhost:8000",
        "http://localhost:5173",
        "http://localhost:5174",
        "http://localhost:5175",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:5174",
        "http://127.0.0.1:5175",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("saved_model/third")
}

fn default_class_indices_path() -> PathBuf {
    PathBuf::from("saved_model/third/class_indices.json")
}

fn default_labels_txt_path() -> PathBuf {
    PathBuf::from("saved_model/third/labels.txt")
}

fn default_onnx_threads() -> usize {
    1
}
