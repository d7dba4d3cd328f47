use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use super::error::NutritionError;
use super::types::{NutritionItem, Provider};

pub const DEFAULT_NUTRITIONIX_URL: &str = "https://trackapi.nutritionix.com/v2/natural/nutrients";

#[derive(Debug, Clone)]
pub struct NutritionixCredentials {
    pub app_id: String,
    pub app_key: String,
}

/// 自然语言营养查询，主提供方
#[derive(Debug, Clone)]
pub struct NutritionixClient {
    http: Client,
    credentials: NutritionixCredentials,
    url: String,
}

#[derive(Serialize)]
struct NaturalQuery<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct NaturalResponse {
    #[serde(default)]
    foods: Option<Vec<NutritionixFood>>,
}

#[derive(Debug, Deserialize)]
struct NutritionixFood {
    food_name: Option<String>,
    serving_weight_grams: Option<f64>,
    nf_calories: Option<f64>,
    nf_protein: Option<f64>,
    nf_total_carbohydrate: Option<f64>,
    nf_sugars: Option<f64>,
    nf_dietary_fiber: Option<f64>,
    nf_total_fat: Option<f64>,
    nf_saturated_fat: Option<f64>,
    nf_sodium: Option<f64>,
    nf_potassium: Option<f64>,
    nf_cholesterol: Option<f64>,
}

impl From<NutritionixFood> for NutritionItem {
    fn from(food: NutritionixFood) -> Self {
        NutritionItem {
            name: food.food_name.unwrap_or_else(|| "Item".to_string()),
            serving_size_g: food.serving_weight_grams,
            calories: food.nf_calories,
            protein_g: food.nf_protein,
            carbohydrates_total_g: food.nf_total_carbohydrate,
            sugar_g: food.nf_sugars,
            fiber_g: food.nf_dietary_fiber,
            fat_total_g: food.nf_total_fat,
            fat_saturated_g: food.nf_saturated_fat,
            sodium_mg: food.nf_sodium,
            potassium_mg: food.nf_potassium,
            cholesterol_mg: food.nf_cholesterol,
        }
    }
}

impl NutritionixClient {
    pub fn new(http: Client, credentials: NutritionixCredentials, url: impl Into<String>) -> Self {
        Self {
            http,
            credentials,
            url: url.into(),
        }
    }

    pub async fn fetch_items(&self, query: &str) -> Result<Vec<NutritionItem>, NutritionError> {
        let response = self
            .http
            .post(&self.url)
            .header(header::ACCEPT, "application/json")
            .header("x-app-id", &self.credentials.app_id)
            .header("x-app-key", &self.credentials.app_key)
            .json(&NaturalQuery { query })
            .send()
            .await
            .map_err(NutritionError::transport(Provider::Nutritionix))?;

        let status = response.status();
        if !status.is_success() {
            // 不重试，直接带上状态码和响应体用于排查
            let body = response.text().await.unwrap_or_default();
            return Err(NutritionError::upstream(
                Provider::Nutritionix,
                status.as_u16(),
                body,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(NutritionError::transport(Provider::Nutritionix))?;
        let payload: NaturalResponse = serde_json::from_str(&body)
            .map_err(|e| NutritionError::parse(Provider::Nutritionix, e))?;

        Ok(payload
            .foods
            .unwrap_or_default()
            .into_iter()
            .map(NutritionItem::from)
            .collect())
    }
}
