use axum::{
    Json,
    extract::{Extension, State},
};

use crate::{AppState, error::AppError, utils::Claims};

use super::model::{Measurement, MeasurementRequest, MeasurementResponse};

#[axum::debug_handler]
pub async fn save_measurement(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<MeasurementRequest>,
) -> Result<Json<MeasurementResponse>, AppError> {
    if req.age <= 0 {
        return Err(AppError::Validation("Age must be a positive number".to_string()));
    }

    let measurement = Measurement::upsert(&state.pool, claims.sub, &req).await?;
    tracing::debug!("Saved measurement for user: {}", claims.sub);
    Ok(Json(MeasurementResponse { measurement }))
}

/// 没有记录时返回 `null`
#[axum::debug_handler]
pub async fn latest_measurement(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<Json<Option<Measurement>>, AppError> {
    let measurement = Measurement::find_latest(&state.pool, claims.sub).await?;
    Ok(Json(measurement))
}
