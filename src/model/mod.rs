mod loader;
mod output;
mod wrapper;

pub use loader::{
    ArchitectureSpec, ModelHandle, ServingSignature, resolve_input_key, resolve_model,
};
pub use output::{RawOutput, TensorData, extract_probabilities};
pub use wrapper::ModelWrapper;
