use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppState, error::AppError, ml::PredictError};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: Value,
    pub message: &'static str,
}

#[axum::debug_handler]
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let data = match req.data {
        Some(data) if !data.is_null() => data,
        _ => return Err(AppError::Validation("No input data provided".to_string())),
    };

    let client = state.predictor.as_ref().ok_or_else(|| {
        AppError::Configuration("Prediction service is not configured".to_string())
    })?;

    match client.predict(&data).await {
        Ok(prediction) => Ok(Json(PredictResponse {
            prediction,
            message: "Prediction successful.",
        })),
        Err(PredictError::Status { status, body }) => {
            tracing::error!("Prediction service error: {} {}", status, body);
            Err(AppError::PredictionService { status, body })
        }
        Err(e @ PredictError::Transport(_)) => {
            tracing::error!("Prediction request failed: {}", e);
            Err(AppError::BadGateway("Prediction service unavailable".to_string()))
        }
    }
}
