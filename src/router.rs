use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AppState,
    middleware::{AUTH_HEADER, auth_middleware, log_errors},
    routes,
};

// 公开路由：注册、登录、营养分析
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/nutrition/analyze", post(routes::nutrition::analyze))
}

// 需要 x-auth-token 的路由
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(routes::user::profile))
        .route(
            "/measurement",
            get(routes::measurement::latest_measurement).post(routes::measurement::save_measurement),
        )
        .route("/ml/predict", post(routes::ml::predict))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let Some(url) = frontend_url else {
        tracing::debug!("FRONTEND_URL not set, using permissive CORS");
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(url) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                header::CONTENT_TYPE,
                header::ACCEPT,
                HeaderName::from_static(AUTH_HEADER),
            ]),
        Err(_) => {
            tracing::warn!("Invalid FRONTEND_URL {}, falling back to permissive CORS", url);
            CorsLayer::permissive()
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(&state));

    Router::new()
        .route("/", get(routes::health))
        .nest("/api", api)
        .layer(axum::middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.config.frontend_url.as_deref()))
        .with_state(state)
}
