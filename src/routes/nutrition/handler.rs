use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    AppState,
    error::AppError,
    nutrition::{AnalyzeRequest, AnalyzeResponse},
};

#[axum::debug_handler]
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    // 请求体缺失或格式不对时按空查询处理，统一返回 "Query is required"
    let query = match payload {
        Ok(Json(req)) => req.query.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!("Unreadable analyze body: {}", rejection);
            String::new()
        }
    };

    let response = state.nutrition.analyze(&query).await?;

    tracing::info!(
        source = %response.source,
        items = response.items.len(),
        "Nutrition analysis served"
    );
    Ok(Json(response))
}
