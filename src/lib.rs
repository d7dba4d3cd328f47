use std::sync::Arc;

use config::Config;
use ml::PredictionClient;
use nutrition::NutritionService;
use sqlx::PgPool;

pub mod config;
pub mod error;
pub mod middleware;
pub mod ml;
pub mod nutrition;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub nutrition: Arc<NutritionService>,
    pub predictor: Option<Arc<PredictionClient>>,
}

impl AppState {
    /// 按配置构建外部服务客户端，所有客户端共用一个 reqwest 连接池
    pub fn new(pool: PgPool, config: Config, http: reqwest::Client) -> Self {
        let nutrition = Arc::new(NutritionService::from_config(&config, http.clone()));
        let predictor = config
            .flask_url
            .clone()
            .map(|url| Arc::new(PredictionClient::new(http, url)));

        Self {
            pool,
            config,
            nutrition,
            predictor,
        }
    }
}
