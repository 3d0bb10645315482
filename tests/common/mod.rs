#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::Request,
};
use dermaserve::{
    config::ModelConfig,
    imaging::PreprocessMode,
    server::handlers::AppState,
    service::PredictionService,
};
use image::{Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write a label source file into the test directory
pub fn write_label_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write label file");
    path
}

/// Model configuration pointing at a directory with no model files, so the
/// service runs in mock prediction mode
pub fn mock_model_config(dir: &TempDir) -> ModelConfig {
    let class_indices_path = write_label_file(
        dir,
        "class_indices.json",
        r#"{"Eczema": 0, "Psoriasis": 1}"#,
    );

    ModelConfig {
        model_path: dir.path().join("no_such_model"),
        class_indices_path,
        labels_txt_path: dir.path().join("labels.txt"),
        preprocess_mode: PreprocessMode::Efficientnet,
        onnx_threads: 1,
    }
}

/// Application state backed by a mock-mode prediction service
pub fn mock_app_state(dir: &TempDir) -> AppState {
    let model_config = mock_model_config(dir);
    let service =
        PredictionService::new(&model_config).expect("Failed to build prediction service");
    AppState {
        service: Arc::new(service),
        model_config: Arc::new(model_config),
    }
}

/// A small valid PNG encoded in memory
pub fn png_image_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, Rgb([180, 120, 90]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("Failed to encode test image");
    buf
}

pub const MULTIPART_BOUNDARY: &str = "dermaserve-test-boundary";

/// Build a multipart/form-data POST request carrying one file field
pub fn multipart_request(
    uri: &str,
    field_name: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"{field_name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("Failed to build multipart request")
}

/// Collect a response body into bytes
pub async fn body_bytes(body: Body) -> Bytes {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body")
}

/// Existence helper used by path-sensitive tests
pub fn missing_path(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    assert!(!Path::new(&path).exists());
    path
}
