use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No valid class label source found. Provide class_indices.json or labels.txt.")]
    NoLabelSource,

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Empty image data provided")]
    EmptyInput,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Unsupported model output: {0}")]
    UnsupportedOutput(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    ImageCodec(#[from] image::ImageError),

    #[error("Inference runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn unsupported_output(msg: impl Into<String>) -> Self {
        Self::UnsupportedOutput(msg.into())
    }

    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }
}
