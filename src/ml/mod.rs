//! 外部机器学习预测服务的 HTTP 客户端，服务本身视为黑盒。

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("prediction service responded with {status}")]
    Status { status: StatusCode, body: Value },
    #[error("prediction service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct PredictPayload<'a> {
    data: &'a Value,
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn predict(&self, data: &Value) -> Result<Value, PredictError> {
        let url = format!("{}/flask-predict", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&PredictPayload { data })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        // 非 JSON 响应体按字符串透传
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status.is_success() {
            Ok(body)
        } else {
            Err(PredictError::Status { status, body })
        }
    }
}
