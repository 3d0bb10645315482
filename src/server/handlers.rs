use super::types::{ApiInfo, ClassesResponse, ErrorResponse, PredictionResponse};
use crate::{
    Error, Result,
    config::ModelConfig,
    service::{PredictionOutcome, PredictionService},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub model_config: Arc<ModelConfig>,
}

/// Root endpoint returning API information.
pub async fn root() -> Json<ApiInfo> {
    Json(ApiInfo {
        message: "Skin Lesion Classification API".to_string(),
        status: "active".to_string(),
    })
}

/// Lists the class names straight from the class-index file.
pub async fn classes(
    State(state): State<AppState>,
) -> std::result::Result<Json<ClassesResponse>, (StatusCode, Json<ErrorResponse>)> {
    match read_class_index_keys(&state.model_config.class_indices_path).await {
        Ok(classes) => Ok(Json(ClassesResponse { classes })),
        Err(e) => {
            error!("Failed to read class index file: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

async fn read_class_index_keys(path: &Path) -> Result<Vec<String>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&raw)?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::config("class index file is not a JSON object"))?;
    Ok(object.keys().cloned().collect())
}

/// Classifies an uploaded image (multipart field `file`).
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Json<PredictionResponse>, (StatusCode, Json<Value>)> {
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let content_type = field.content_type().map(str::to_string).unwrap_or_default();
            if !content_type.starts_with("image/") {
                return Err(bad_request("File must be an image"));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read upload: {}", e)))?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }

    let Some(image_data) = image_data else {
        return Err(bad_request("No file uploaded"));
    };

    info!("Received prediction request ({} bytes)", image_data.len());

    match state.service.predict(&image_data).await {
        PredictionOutcome::Success(report) => Ok(Json(report.into())),
        PredictionOutcome::Failure(failure) => {
            error!("Prediction failed: {}", failure.error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": failure.error,
                    "message": failure.message,
                })),
            ))
        }
    }
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    let message = message.into();
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}
