use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::nutrition::NutritionError;

pub const NUTRITION_UNAVAILABLE: &str =
    "Unable to analyze nutrition right now. Please try again later.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    BadGateway(String),
    /// 预测服务返回的非 2xx，原样带回状态码和响应体
    #[error("prediction service responded with {status}")]
    PredictionService { status: StatusCode, body: Value },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Nutrition(#[from] NutritionError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct PredictionErrorResponse {
    message: &'static str,
    error: Value,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::PredictionService { status, .. } => *status,
            AppError::Nutrition(e) => match e {
                NutritionError::Validation(_) => StatusCode::BAD_REQUEST,
                NutritionError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                NutritionError::Upstream { .. }
                | NutritionError::Parse { .. }
                | NutritionError::Transport { .. }
                | NutritionError::Unavailable => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// 返回给调用方的文本，上游和数据库细节只写日志
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Server error".to_string(),
            AppError::Nutrition(e) => match e {
                NutritionError::Validation(m) | NutritionError::Configuration(m) => m.clone(),
                _ => NUTRITION_UNAVAILABLE.to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed with {}", status);
        }

        if let AppError::PredictionService { body, .. } = self {
            let body = Json(PredictionErrorResponse {
                message: "Prediction service error",
                error: body,
            });
            return (status, body).into_response();
        }

        let body = Json(ErrorResponse {
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}
