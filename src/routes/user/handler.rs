use axum::{
    Json,
    extract::{Extension, State},
};

use crate::{AppState, error::AppError, utils::Claims};

use super::model::{ProfileResponse, User};

#[axum::debug_handler]
pub async fn profile(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = User::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse { user_data: user }))
}
