use axum::{Json, extract::State};

use crate::{
    AppState,
    error::AppError,
    routes::user::model::{PublicUser, User},
    utils::generate_token,
};

use super::model::{AuthResponse, LoginRequest, SignupRequest};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

fn issue_token(state: &AppState, user: &User) -> Result<Json<AuthResponse>, AppError> {
    let token = generate_token(user.id, &state.config).map_err(|e| {
        AppError::Internal(format!("Failed to sign session token: {}", e))
    })?;

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(user),
    }))
}

#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username, email and password are required".to_string(),
        ));
    }

    if User::find_by_email(&state.pool, email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let user = match User::create(&state.pool, username, email, &req.password).await {
        Ok(user) => user,
        // 并发注册同一邮箱时由唯一索引兜底
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    issue_token(&state, &user)
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = User::find_by_email(&state.pool, req.email.trim())
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    let matches = user
        .verify_login(&req.password)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
    if !matches {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    issue_token(&state, &user)
}
