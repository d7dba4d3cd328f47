use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;

use super::error::NutritionError;
use super::token::{TokenCache, TokenGrant};
use super::types::{NutritionItem, OneOrMany, Provider, lenient_f64};
use crate::utils::string_or_number;

pub const DEFAULT_FATSECRET_API_URL: &str = "https://platform.fatsecret.com/rest/server.api";
pub const DEFAULT_FATSECRET_TOKEN_URL: &str = "https://oauth.fatsecret.com/connect/token";

const SEARCH_MAX_RESULTS: u32 = 5;
const DETAIL_CANDIDATES: usize = 3;

#[derive(Debug, Clone)]
pub struct FatSecretCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct FatSecretEndpoints {
    pub api_url: String,
    pub token_url: String,
}

impl Default for FatSecretEndpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_FATSECRET_API_URL.to_string(),
            token_url: DEFAULT_FATSECRET_TOKEN_URL.to_string(),
        }
    }
}

/// 一次带令牌请求的结果。401 单独列出，由调用方决定是否刷新令牌重试。
#[derive(Debug)]
enum Attempt {
    Success(Value),
    AuthExpired,
}

/// 备用提供方：OAuth client-credentials 认证，先搜索再逐个取详情
#[derive(Debug)]
pub struct FatSecretClient {
    http: Client,
    credentials: FatSecretCredentials,
    endpoints: FatSecretEndpoints,
    tokens: TokenCache,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Option<FoodsPage>,
}

#[derive(Debug, Deserialize)]
struct FoodsPage {
    // 逐条解码，坏条目不能拖垮整页
    #[serde(default)]
    food: OneOrMany<Value>,
}

#[derive(Debug, Deserialize)]
struct FoodSummary {
    #[serde(deserialize_with = "string_or_number")]
    food_id: String,
    #[serde(default)]
    food_name: Option<String>,
    #[serde(default)]
    brand_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(default)]
    food: Option<FoodDetail>,
}

#[derive(Debug, Deserialize)]
struct FoodDetail {
    #[serde(default)]
    servings: Option<Servings>,
}

#[derive(Debug, Deserialize)]
struct Servings {
    #[serde(default)]
    serving: OneOrMany<Serving>,
}

#[derive(Debug, Deserialize)]
struct Serving {
    #[serde(default, deserialize_with = "lenient_f64")]
    metric_serving_amount: Option<f64>,
    #[serde(default)]
    metric_serving_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    carbohydrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    sugar: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    fiber: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    saturated_fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    sodium: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    potassium: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    cholesterol: Option<f64>,
}

/// "品牌 - 名称"，没有品牌时只用名称，两者都没有时为 "Item"
fn display_name(food: &FoodSummary) -> String {
    let parts: Vec<&str> = [food.brand_name.as_deref(), food.food_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        "Item".to_string()
    } else {
        parts.join(" - ")
    }
}

fn item_from_serving(food: &FoodSummary, serving: &Serving) -> NutritionItem {
    let serving_size_g = match serving.metric_serving_unit.as_deref() {
        Some("g") => serving.metric_serving_amount,
        _ => None,
    };

    NutritionItem {
        name: display_name(food),
        serving_size_g,
        calories: serving.calories,
        protein_g: serving.protein,
        carbohydrates_total_g: serving.carbohydrate.or(serving.carbs),
        sugar_g: serving.sugar,
        fiber_g: serving.fiber,
        fat_total_g: serving.fat,
        fat_saturated_g: serving.saturated_fat,
        sodium_mg: serving.sodium,
        potassium_mg: serving.potassium,
        cholesterol_mg: serving.cholesterol,
    }
}

/// 响应体里的 `error` 对象，HTTP 状态可能仍是 200
fn reported_error(data: &Value) -> Option<(String, String)> {
    let error = data.get("error")?;
    let code = match error.get("code") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "unknown".to_string(),
    };
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("FatSecret error")
        .to_string();
    Some((code, message))
}

impl FatSecretClient {
    pub fn new(http: Client, credentials: FatSecretCredentials, endpoints: FatSecretEndpoints) -> Self {
        Self {
            http,
            credentials,
            endpoints,
            tokens: TokenCache::new(),
        }
    }

    pub async fn fetch_items(&self, query: &str) -> Result<Vec<NutritionItem>, NutritionError> {
        let search = self
            .request(
                "foods.search",
                &[
                    ("search_expression", query.to_string()),
                    ("max_results", SEARCH_MAX_RESULTS.to_string()),
                ],
            )
            .await?;
        let search: SearchResponse = serde_json::from_value(search)
            .map_err(|e| NutritionError::parse(Provider::FatSecret, e))?;

        let candidates = search
            .foods
            .map(|page| page.food.into_vec())
            .unwrap_or_default();

        let mut items = Vec::new();
        for raw in candidates.into_iter().take(DETAIL_CANDIDATES) {
            let food = match serde_json::from_value::<FoodSummary>(raw) {
                Ok(food) => food,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable FatSecret search entry");
                    continue;
                }
            };

            // 单个详情失败不影响其它候选
            match self.fetch_detail(&food).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => tracing::debug!(food_id = %food.food_id, "FatSecret food has no servings"),
                Err(e) => tracing::warn!(food_id = %food.food_id, error = %e, "FatSecret detail fetch failed"),
            }
        }

        Ok(items)
    }

    async fn fetch_detail(&self, food: &FoodSummary) -> Result<Option<NutritionItem>, NutritionError> {
        let detail = self
            .request("food.get.v3", &[("food_id", food.food_id.clone())])
            .await?;
        let detail: DetailResponse = serde_json::from_value(detail)
            .map_err(|e| NutritionError::parse(Provider::FatSecret, e))?;

        let serving = detail
            .food
            .and_then(|d| d.servings)
            .and_then(|s| s.serving.into_vec().into_iter().next());

        Ok(serving.map(|serving| item_from_serving(food, &serving)))
    }

    /// 带认证的 API 调用。遇到 401 时作废缓存、强制刷新令牌后只重试一次。
    async fn request(&self, method: &str, params: &[(&str, String)]) -> Result<Value, NutritionError> {
        let token = self.access_token(false).await?;
        match self.send(method, params, &token).await? {
            Attempt::Success(data) => return Ok(data),
            Attempt::AuthExpired => {
                tracing::warn!(method, "FatSecret rejected cached token, refreshing once");
            }
        }

        self.tokens.invalidate().await;
        let token = self.access_token(true).await?;
        match self.send(method, params, &token).await? {
            Attempt::Success(data) => Ok(data),
            Attempt::AuthExpired => Err(NutritionError::upstream(
                Provider::FatSecret,
                StatusCode::UNAUTHORIZED.as_u16(),
                format!("{} rejected a freshly issued token", method),
            )),
        }
    }

    async fn send(
        &self,
        method: &str,
        params: &[(&str, String)],
        token: &str,
    ) -> Result<Attempt, NutritionError> {
        let response = self
            .http
            .get(&self.endpoints.api_url)
            .query(&[("method", method), ("format", "json")])
            .query(params)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await
            .map_err(NutritionError::transport(Provider::FatSecret))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(Attempt::AuthExpired);
        }

        let body = response
            .text()
            .await
            .map_err(NutritionError::transport(Provider::FatSecret))?;
        if !status.is_success() {
            return Err(NutritionError::upstream(
                Provider::FatSecret,
                status.as_u16(),
                body,
            ));
        }

        let data = parse_body(&body)?;
        if let Some((code, message)) = reported_error(&data) {
            return Err(NutritionError::Upstream {
                provider: Provider::FatSecret,
                status: Some(status.as_u16()),
                code: Some(code),
                message,
            });
        }

        Ok(Attempt::Success(data))
    }

    async fn access_token(&self, force_refresh: bool) -> Result<String, NutritionError> {
        self.tokens
            .get_or_refresh(force_refresh, || self.exchange_credentials())
            .await
    }

    async fn exchange_credentials(&self) -> Result<TokenGrant, NutritionError> {
        tracing::debug!("Requesting FatSecret access token");
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", "basic")])
            .send()
            .await
            .map_err(NutritionError::transport(Provider::FatSecret))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(NutritionError::transport(Provider::FatSecret))?;
        if !status.is_success() {
            return Err(NutritionError::upstream(
                Provider::FatSecret,
                status.as_u16(),
                format!("token request failed: {}", body),
            ));
        }

        let data = parse_body(&body)?;
        let access_token = data
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty());
        let expires_in = data.get("expires_in").and_then(Value::as_f64);

        match (access_token, expires_in) {
            (Some(token), Some(expires_in)) => Ok(TokenGrant {
                access_token: token.to_string(),
                expires_in,
            }),
            _ => Err(NutritionError::Configuration(
                "FatSecret token response missing fields".to_string(),
            )),
        }
    }
}

fn parse_body(body: &str) -> Result<Value, NutritionError> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(body).map_err(|e| NutritionError::parse(Provider::FatSecret, e))
}
