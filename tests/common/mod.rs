#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use fittrack_backend::{AppState, config::Config, router::create_router};
use fittrack_backend::nutrition::{
    FatSecretClient, FatSecretCredentials, FatSecretEndpoints, NutritionixClient,
    NutritionixCredentials,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NUTRITIONIX_PATH: &str = "/v2/natural/nutrients";
pub const FATSECRET_API_PATH: &str = "/rest/server.api";
pub const FATSECRET_TOKEN_PATH: &str = "/connect/token";

pub fn nutritionix_client(server: &MockServer) -> NutritionixClient {
    NutritionixClient::new(
        reqwest::Client::new(),
        NutritionixCredentials {
            app_id: "app-id".into(),
            app_key: "app-key".into(),
        },
        format!("{}{}", server.uri(), NUTRITIONIX_PATH),
    )
}

pub fn fatsecret_endpoints(server: &MockServer) -> FatSecretEndpoints {
    FatSecretEndpoints {
        api_url: format!("{}{}", server.uri(), FATSECRET_API_PATH),
        token_url: format!("{}{}", server.uri(), FATSECRET_TOKEN_PATH),
    }
}

pub fn fatsecret_client(server: &MockServer) -> FatSecretClient {
    FatSecretClient::new(
        reqwest::Client::new(),
        FatSecretCredentials {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
        },
        fatsecret_endpoints(server),
    )
}

/// 用于 `Config::from_lookup` 的环境变量表
pub fn env_vars(pairs: &[(&str, String)]) -> HashMap<String, String> {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgres://localhost/fittrack_test".to_string()),
        ("JWT_SECRET", "test-secret".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for (k, v) in pairs {
        vars.insert(k.to_string(), v.clone());
    }
    vars
}

pub fn build_app(pool: PgPool, pairs: &[(&str, String)]) -> (Router, Config) {
    let vars = env_vars(pairs);
    let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
    let state = AppState::new(pool, config.clone(), reqwest::Client::new());
    (create_router(state), config)
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn apple_and_oatmeal() -> Value {
    json!({
        "foods": [
            {
                "food_name": "apple",
                "serving_weight_grams": 182,
                "nf_calories": 94.64,
                "nf_protein": 0.47,
                "nf_total_carbohydrate": 25.13
            },
            {
                "food_name": "oatmeal",
                "serving_weight_grams": 234,
                "nf_calories": 166.14,
                "nf_protein": 5.94,
                "nf_total_fat": 3.56
            }
        ]
    })
}

pub fn token_body(token: &str, expires_in: u64) -> Value {
    json!({ "access_token": token, "token_type": "Bearer", "expires_in": expires_in })
}

pub async fn mount_token(server: &MockServer, token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path(FATSECRET_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token, expires_in)))
        .mount(server)
        .await;
}

pub async fn mount_search(server: &MockServer, foods: Value) {
    Mock::given(method("GET"))
        .and(path(FATSECRET_API_PATH))
        .and(query_param("method", "foods.search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "foods": { "food": foods } })))
        .mount(server)
        .await;
}

pub async fn mount_detail(server: &MockServer, food_id: &str, serving: Value) {
    Mock::given(method("GET"))
        .and(path(FATSECRET_API_PATH))
        .and(query_param("method", "food.get.v3"))
        .and(query_param("food_id", food_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "food": { "food_id": food_id, "servings": { "serving": serving } }
        })))
        .mount(server)
        .await;
}
