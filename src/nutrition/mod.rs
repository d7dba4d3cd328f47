//! 营养分析：主提供方 Nutritionix，凭据齐全时以 FatSecret 作为备用。

mod error;
mod fatsecret;
mod nutritionix;
mod token;
mod types;

pub use error::NutritionError;
pub use fatsecret::{
    DEFAULT_FATSECRET_API_URL, DEFAULT_FATSECRET_TOKEN_URL, FatSecretClient, FatSecretCredentials,
    FatSecretEndpoints,
};
pub use nutritionix::{DEFAULT_NUTRITIONIX_URL, NutritionixClient, NutritionixCredentials};
pub use token::{CachedCredential, MAX_TOKEN_LIFETIME, SAFETY_WINDOW, TokenCache, TokenGrant};
pub use types::{AnalyzeRequest, AnalyzeResponse, NutritionItem, Provider};

use reqwest::Client;

use crate::config::Config;

pub const MISSING_PRIMARY_CREDENTIALS: &str = "Server missing Nutritionix credentials";

/// 对外的营养查询入口。
///
/// 先调用主提供方；失败后只根据备用凭据是否存在决定是否转到备用提供方，
/// 与查询内容无关。
#[derive(Debug)]
pub struct NutritionService {
    primary: Option<NutritionixClient>,
    fallback: Option<FatSecretClient>,
}

impl NutritionService {
    pub fn new(primary: Option<NutritionixClient>, fallback: Option<FatSecretClient>) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(config: &Config, http: Client) -> Self {
        let primary = config.nutritionix.clone().map(|credentials| {
            NutritionixClient::new(http.clone(), credentials, config.nutritionix_url.clone())
        });
        let fallback = config.fatsecret.clone().map(|credentials| {
            FatSecretClient::new(http.clone(), credentials, config.fatsecret_endpoints.clone())
        });

        if primary.is_none() {
            tracing::warn!("Nutritionix credentials not configured");
        }
        if fallback.is_none() {
            tracing::info!("FatSecret fallback disabled, credentials not configured");
        }

        Self::new(primary, fallback)
    }

    pub async fn analyze(&self, query: &str) -> Result<AnalyzeResponse, NutritionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NutritionError::Validation("Query is required".to_string()));
        }

        let primary_error = match &self.primary {
            Some(client) => match client.fetch_items(query).await {
                Ok(items) => {
                    return Ok(AnalyzeResponse {
                        items,
                        source: Provider::Nutritionix,
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Nutritionix upstream error");
                    e
                }
            },
            None => NutritionError::Configuration(MISSING_PRIMARY_CREDENTIALS.to_string()),
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_error);
        };

        match fallback.fetch_items(query).await {
            Ok(items) if !items.is_empty() => Ok(AnalyzeResponse {
                items,
                source: Provider::FatSecret,
            }),
            Ok(_) => {
                tracing::warn!(query, "FatSecret fallback returned no items");
                Err(NutritionError::Unavailable)
            }
            Err(e) => {
                tracing::error!(error = %e, "FatSecret fallback failed");
                Err(NutritionError::Unavailable)
            }
        }
    }
}
