use crate::service::PredictionReport;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ClassesResponse {
    pub classes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub predictions: BTreeMap<String, f32>,
    pub top_prediction: String,
    pub confidence: f32,
}

impl From<PredictionReport> for PredictionResponse {
    fn from(report: PredictionReport) -> Self {
        Self {
            predictions: report.predictions,
            top_prediction: report.top_prediction,
            confidence: report.confidence,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
