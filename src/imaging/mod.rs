//! Image validation and preprocessing.
//!
//! Decoding and resizing are delegated to the `image` crate; the result is a
//! single-item NHWC batch tensor matching the trained network's input.

use crate::{Error, Result};
use image::imageops::FilterType;
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Side length the trained network expects.
pub const TARGET_SIZE: u32 = 224;

/// Pixel scaling applied before inference, matching how the network was
/// trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessMode {
    /// Raw pixel values; the network normalizes internally.
    #[default]
    Efficientnet,
    /// Scale to [-1, 1].
    ResnetV2,
    /// Scale to [0, 1].
    Scale01,
    /// No scaling.
    Raw,
}

/// Returns true if the bytes decode as a supported image format.
pub fn validate_image(image_data: &[u8]) -> bool {
    match image::load_from_memory(image_data) {
        Ok(_) => true,
        Err(e) => {
            error!("Invalid image: {}", e);
            false
        }
    }
}

/// Decodes, resizes and scales an uploaded image into a `(1, 224, 224, 3)`
/// f32 batch tensor.
pub fn preprocess_image(image_data: &[u8], mode: PreprocessMode) -> Result<Array4<f32>> {
    let decoded = image::load_from_memory(image_data)
        .map_err(|e| Error::invalid_image(format!("Invalid image data: {}", e)))?;

    let resized = decoded
        .resize_exact(TARGET_SIZE, TARGET_SIZE, FilterType::Triangle)
        .to_rgb8();

    let side = TARGET_SIZE as usize;
    let mut input = Array4::<f32>::zeros((1, side, side, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            input[[0, y as usize, x as usize, channel]] = f32::from(pixel[channel]);
        }
    }

    Ok(match mode {
        PreprocessMode::Efficientnet | PreprocessMode::Raw => input,
        PreprocessMode::ResnetV2 => input.mapv(|v| v / 127.5 - 1.0),
        PreprocessMode::Scale01 => input.mapv(|v| v / 255.0),
    })
}
