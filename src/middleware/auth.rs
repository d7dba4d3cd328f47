use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError, utils::verify_token};

pub const AUTH_HEADER: &str = "x-auth-token";

/// 校验 `x-auth-token` 并把解析出的 Claims 放进请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("No token provided, authorization denied".to_string())
        })?;

    let claims = verify_token(token, &state.config).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        AppError::Unauthorized("Token is not valid".to_string())
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
