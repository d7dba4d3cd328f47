mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::*;
use fittrack_backend::{config::Config, utils::generate_token};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{any, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// 这些路由不访问数据库，连接池延迟连接即可
fn app_with(pairs: &[(&str, String)]) -> (Router, Config) {
    let vars = env_vars(pairs);
    let pool = PgPoolOptions::new()
        .connect_lazy(&vars["DATABASE_URL"])
        .unwrap();
    build_app(pool, pairs)
}

fn nutritionix_env(server: &MockServer) -> Vec<(&'static str, String)> {
    vec![
        ("NUTRITIONIX_APP_ID", "app-id".to_string()),
        ("NUTRITIONIX_API_KEY", "app-key".to_string()),
        ("NUTRITIONIX_URL", format!("{}{}", server.uri(), NUTRITIONIX_PATH)),
    ]
}

fn fatsecret_env(server: &MockServer) -> Vec<(&'static str, String)> {
    let endpoints = fatsecret_endpoints(server);
    vec![
        ("FATSECRET_CLIENT_ID", "client-id".to_string()),
        ("FATSECRET_CLIENT_SECRET", "client-secret".to_string()),
        ("FATSECRET_API_URL", endpoints.api_url),
        ("FATSECRET_TOKEN_URL", endpoints.token_url),
    ]
}

#[tokio::test]
async fn health_check_responds() {
    let (app, _) = app_with(&[]);
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Backend is running!");
}

#[tokio::test]
async fn blank_query_is_rejected_without_outbound_calls() {
    let primary = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&primary)
        .await;

    let (app, _) = app_with(&nutritionix_env(&primary));
    let (status, body) = send(app, post_json("/api/nutrition/analyze", json!({ "query": "   " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Query is required" }));
}

#[tokio::test]
async fn missing_body_is_treated_as_empty_query() {
    let (app, _) = app_with(&[]);
    let request = Request::post("/api/nutrition/analyze")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query is required");
}

#[tokio::test]
async fn analyze_returns_primary_items() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(NUTRITIONIX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(apple_and_oatmeal()))
        .mount(&primary)
        .await;

    let (app, _) = app_with(&nutritionix_env(&primary));
    let (status, body) = send(
        app,
        post_json("/api/nutrition/analyze", json!({ "query": "1 apple and 1 cup of oatmeal" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "nutritionix");
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["name"], "apple");
    assert_eq!(body["items"][0]["protein_g"], 0.47);
    // 缺失的营养素不出现在响应里
    assert!(body["items"][0].get("sodium_mg").is_none());
}

#[tokio::test]
async fn analyze_falls_back_when_primary_fails() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&primary)
        .await;
    mount_token(&fallback, "tok", 3600).await;
    mount_search(&fallback, json!([{ "food_id": "9", "food_name": "Apple" }])).await;
    mount_detail(&fallback, "9", json!({ "calories": "52" })).await;

    let mut env = nutritionix_env(&primary);
    env.extend(fatsecret_env(&fallback));
    let (app, _) = app_with(&env);
    let (status, body) = send(app, post_json("/api/nutrition/analyze", json!({ "query": "apple" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fatsecret");
    assert_eq!(body["items"][0]["calories"], 52.0);
}

#[tokio::test]
async fn analyze_without_any_credentials_is_a_server_error() {
    let (app, _) = app_with(&[]);
    let (status, body) = send(app, post_json("/api/nutrition/analyze", json!({ "query": "apple" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Server missing Nutritionix credentials" }));
}

#[tokio::test]
async fn primary_failure_without_fallback_is_bad_gateway() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("secret internal detail"))
        .mount(&primary)
        .await;

    let (app, _) = app_with(&nutritionix_env(&primary));
    let (status, body) = send(app, post_json("/api/nutrition/analyze", json!({ "query": "apple" }))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({ "error": "Unable to analyze nutrition right now. Please try again later." })
    );
}

#[tokio::test]
async fn protected_route_requires_token() {
    let (app, _) = app_with(&[]);
    let (status, body) = send(
        app,
        Request::get("/api/user/profile").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided, authorization denied");
}

#[tokio::test]
async fn protected_route_rejects_forged_token() {
    let (app, _) = app_with(&[]);
    let request = Request::get("/api/measurement")
        .header("x-auth-token", "not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is not valid");
}

fn authed_predict(config: &Config, body: Value) -> Request<Body> {
    let token = generate_token(Uuid::new_v4(), config).unwrap();
    Request::post("/api/ml/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-auth-token", token)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn predict_requires_input_data() {
    let flask = MockServer::start().await;
    let (app, config) = app_with(&[("FLASK_URL", flask.uri())]);
    let (status, body) = send(app, authed_predict(&config, json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No input data provided");
}

#[tokio::test]
async fn predict_forwards_data_to_prediction_service() {
    let flask = MockServer::start().await;
    let data = json!({ "units": "metric", "age": 30, "bmi": 22.1 });
    Mock::given(method("POST"))
        .and(path("/flask-predict"))
        .and(body_json(json!({ "data": data })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "diet": "balanced" })))
        .expect(1)
        .mount(&flask)
        .await;

    let (app, config) = app_with(&[("FLASK_URL", flask.uri())]);
    let (status, body) = send(app, authed_predict(&config, json!({ "data": data }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!({ "diet": "balanced" }));
    assert_eq!(body["message"], "Prediction successful.");
}

#[tokio::test]
async fn predict_propagates_upstream_status() {
    let flask = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "No data provided" })))
        .mount(&flask)
        .await;

    let (app, config) = app_with(&[("FLASK_URL", flask.uri())]);
    let (status, body) = send(app, authed_predict(&config, json!({ "data": { "age": 1 } }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Prediction service error");
    assert_eq!(body["error"], json!({ "error": "No data provided" }));
}

#[tokio::test]
async fn predict_without_service_url_is_a_server_error() {
    let (app, config) = app_with(&[]);
    let (status, body) = send(app, authed_predict(&config, json!({ "data": { "age": 1 } }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Prediction service is not configured");
}

#[tokio::test]
async fn large_prediction_error_body_is_passed_through() {
    let flask = MockServer::start().await;
    let traceback = "x".repeat(5 * 1024);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": traceback })))
        .mount(&flask)
        .await;

    let (app, config) = app_with(&[("FLASK_URL", flask.uri())]);
    let (status, body) = send(app, authed_predict(&config, json!({ "data": { "age": 1 } }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Prediction service error");
    assert_eq!(body["error"]["error"].as_str().unwrap().len(), 5 * 1024);
}
