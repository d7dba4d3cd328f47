use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::nutrition::{
    DEFAULT_FATSECRET_API_URL, DEFAULT_FATSECRET_TOKEN_URL, DEFAULT_NUTRITIONIX_URL,
    FatSecretCredentials, FatSecretEndpoints, NutritionixCredentials,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub frontend_url: Option<String>,
    pub flask_url: Option<String>,
    pub nutritionix: Option<NutritionixCredentials>,
    pub nutritionix_url: String,
    pub fatsecret: Option<FatSecretCredentials>,
    pub fatsecret_endpoints: FatSecretEndpoints,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意键值来源构造配置，空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let jwt_expiration_secs = match get("JWT_EXPIRATION") {
            Some(raw) => raw
                .trim_end_matches('h')
                .parse::<u64>()
                .ok()
                .and_then(|hours| hours.checked_mul(3600))
                .ok_or_else(|| ConfigError::Invalid {
                    name: "JWT_EXPIRATION",
                    value: raw.clone(),
                })?,
            None => 3600,
        };

        let server_port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
            })?,
            None => 5050,
        };

        let nutritionix = match (get("NUTRITIONIX_APP_ID"), get("NUTRITIONIX_API_KEY")) {
            (Some(app_id), Some(app_key)) => Some(NutritionixCredentials { app_id, app_key }),
            _ => None,
        };

        let fatsecret = match (get("FATSECRET_CLIENT_ID"), get("FATSECRET_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(FatSecretCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
            frontend_url: get("FRONTEND_URL"),
            flask_url: get("FLASK_URL").map(|url| url.trim_end_matches('/').to_string()),
            nutritionix,
            nutritionix_url: get("NUTRITIONIX_URL")
                .unwrap_or_else(|| DEFAULT_NUTRITIONIX_URL.to_string()),
            fatsecret,
            fatsecret_endpoints: FatSecretEndpoints {
                api_url: get("FATSECRET_API_URL")
                    .unwrap_or_else(|| DEFAULT_FATSECRET_API_URL.to_string()),
                token_url: get("FATSECRET_TOKEN_URL")
                    .unwrap_or_else(|| DEFAULT_FATSECRET_TOKEN_URL.to_string()),
            },
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }
}
