//! Normalization of heterogeneous predictor outputs.
//!
//! Depending on which load strategy produced the handle, a prediction comes
//! back as a flat array, an opaque tensor, or a mapping of named tensors.
//! Everything is coerced into one flat probability vector aligned to class
//! order.

use crate::{Error, Result};

// Output names tried first when a prediction is a named mapping.
const PREFERRED_OUTPUT_KEYS: [&str; 5] = [
    "probabilities",
    "predictions",
    "outputs",
    "output_0",
    "Identity",
];

/// Raw tensor payload: shape plus row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData {
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

/// A predictor's raw output before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Already a flat numeric array.
    Array(Vec<f32>),
    /// An opaque tensor handle.
    Tensor(TensorData),
    /// Named tensors in the mapping's iteration order.
    Named(Vec<(String, TensorData)>),
}

/// Coerces a raw output into a flat probability vector.
///
/// Named mappings select the first present key from the preferred list,
/// falling back to the first entry. A `(1, N)` single-item batch collapses
/// to `(N,)`.
pub fn extract_probabilities(raw: RawOutput) -> Result<Vec<f32>> {
    let tensor = match raw {
        RawOutput::Array(values) => return Ok(values),
        RawOutput::Tensor(tensor) => tensor,
        RawOutput::Named(entries) => {
            if entries.is_empty() {
                return Err(Error::unsupported_output("empty output mapping"));
            }
            let selected = PREFERRED_OUTPUT_KEYS
                .iter()
                .find_map(|key| entries.iter().find(|(name, _)| name == key))
                .unwrap_or(&entries[0]);
            selected.1.clone()
        }
    };

    flatten(tensor)
}

fn flatten(tensor: TensorData) -> Result<Vec<f32>> {
    let expected: usize = tensor.shape.iter().map(|&d| d as usize).product();
    if expected != tensor.data.len() {
        return Err(Error::unsupported_output(format!(
            "tensor shape {:?} does not match {} data elements",
            tensor.shape,
            tensor.data.len()
        )));
    }

    match tensor.shape.as_slice() {
        [_] => Ok(tensor.data),
        [1, _] => Ok(tensor.data),
        other => Err(Error::unsupported_output(format!(
            "unexpected output shape {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tensor(shape: &[i64], data: &[f32]) -> TensorData {
        TensorData {
            shape: shape.to_vec(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn flat_array_passes_through_unchanged() {
        let probs = extract_probabilities(RawOutput::Array(vec![0.1, 0.9])).unwrap();
        assert_eq!(probs, vec![0.1, 0.9]);
    }

    #[test]
    fn single_item_batch_collapses() {
        let raw = RawOutput::Tensor(tensor(&[1, 3], &[0.2, 0.3, 0.5]));
        assert_eq!(extract_probabilities(raw).unwrap(), vec![0.2, 0.3, 0.5]);
    }

    #[test]
    fn rank_one_tensor_is_unchanged() {
        let raw = RawOutput::Tensor(tensor(&[3], &[0.2, 0.3, 0.5]));
        assert_eq!(extract_probabilities(raw).unwrap(), vec![0.2, 0.3, 0.5]);
    }

    #[test]
    fn multi_item_batch_is_unsupported() {
        let raw = RawOutput::Tensor(tensor(&[2, 2], &[0.5, 0.5, 0.5, 0.5]));
        let err = extract_probabilities(raw).unwrap_err();
        assert!(err.to_string().contains("unexpected output shape"));
    }

    #[test]
    fn named_mapping_selects_preferred_key() {
        let raw = RawOutput::Named(vec![
            ("logits".to_string(), tensor(&[1, 2], &[2.0, 3.0])),
            ("probabilities".to_string(), tensor(&[1, 2], &[0.4, 0.6])),
        ]);
        assert_eq!(extract_probabilities(raw).unwrap(), vec![0.4, 0.6]);
    }

    #[test]
    fn named_mapping_respects_priority_order() {
        // "predictions" outranks "Identity" even when listed later
        let raw = RawOutput::Named(vec![
            ("Identity".to_string(), tensor(&[2], &[0.9, 0.1])),
            ("predictions".to_string(), tensor(&[2], &[0.3, 0.7])),
        ]);
        assert_eq!(extract_probabilities(raw).unwrap(), vec![0.3, 0.7]);
    }

    #[test]
    fn named_mapping_without_preferred_key_takes_first_entry() {
        let raw = RawOutput::Named(vec![
            ("dense_2".to_string(), tensor(&[1, 2], &[0.25, 0.75])),
            ("aux".to_string(), tensor(&[1, 2], &[0.5, 0.5])),
        ]);
        assert_eq!(extract_probabilities(raw).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn empty_mapping_is_unsupported() {
        let err = extract_probabilities(RawOutput::Named(vec![])).unwrap_err();
        assert!(err.to_string().contains("empty output mapping"));
    }

    #[test]
    fn shape_data_mismatch_is_unsupported() {
        let raw = RawOutput::Tensor(tensor(&[1, 4], &[0.5, 0.5]));
        let err = extract_probabilities(raw).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
