use thiserror::Error;

use super::types::Provider;

#[derive(Debug, Error)]
pub enum NutritionError {
    /// 调用方输入错误
    #[error("{0}")]
    Validation(String),

    /// 缺少所需的凭据或凭据交换结果不完整
    #[error("{0}")]
    Configuration(String),

    /// 上游返回非 2xx 或在响应体里报告了错误
    #[error("{provider} upstream error (status {status:?}, code {code:?}): {message}")]
    Upstream {
        provider: Provider,
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("{provider} returned malformed JSON: {message}")]
    Parse { provider: Provider, message: String },

    #[error("{provider} request could not be sent: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// 主、备提供方都没有给出可用结果
    #[error("no nutrition provider produced a result")]
    Unavailable,
}

impl NutritionError {
    pub(crate) fn upstream(provider: Provider, status: u16, message: impl Into<String>) -> Self {
        NutritionError::Upstream {
            provider,
            status: Some(status),
            code: None,
            message: message.into(),
        }
    }

    pub(crate) fn parse(provider: Provider, err: impl std::fmt::Display) -> Self {
        NutritionError::Parse {
            provider,
            message: err.to_string(),
        }
    }

    pub(crate) fn transport(provider: Provider) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| NutritionError::Transport { provider, source }
    }
}
