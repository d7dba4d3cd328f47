use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::string_or_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

// 身高体重按用户选择的单位原样保存
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRequest {
    pub units: Units,
    pub age: i32,
    pub sex: Sex,
    #[serde(deserialize_with = "string_or_number")]
    pub height: String,
    #[serde(deserialize_with = "string_or_number")]
    pub weight: String,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub body_fat: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub user_id: Uuid,
    pub units: String,
    pub age: i32,
    pub sex: String,
    pub height: String,
    pub weight: String,
    pub bmi: Option<f64>,
    pub body_fat: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeasurementResponse {
    pub measurement: Measurement,
}

impl Measurement {
    /// 每个用户只保留一条记录，存在则覆盖
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        req: &MeasurementRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Measurement>(
            r#"
            INSERT INTO user_measurements
                (user_id, units, age, sex, height, weight, bmi, body_fat, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                units = EXCLUDED.units,
                age = EXCLUDED.age,
                sex = EXCLUDED.sex,
                height = EXCLUDED.height,
                weight = EXCLUDED.weight,
                bmi = EXCLUDED.bmi,
                body_fat = EXCLUDED.body_fat,
                updated_at = NOW()
            RETURNING user_id, units, age, sex, height, weight, bmi, body_fat, updated_at
            "#,
        )
        .bind(user_id)
        .bind(req.units.as_str())
        .bind(req.age)
        .bind(req.sex.as_str())
        .bind(req.height.as_str())
        .bind(req.weight.as_str())
        .bind(req.bmi)
        .bind(req.body_fat)
        .fetch_one(pool)
        .await
    }

    pub async fn find_latest(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Measurement>(
            r#"
            SELECT user_id, units, age, sex, height, weight, bmi, body_fat, updated_at
            FROM user_measurements
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
