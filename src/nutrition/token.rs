use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::error::NutritionError;

/// 从上游声明的有效期中扣除的余量，避免令牌在请求途中过期
pub const SAFETY_WINDOW: Duration = Duration::from_secs(60);

/// 上游声明的有效期超过这个值时按这个值缓存
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 3600);

/// client-credentials 交换得到的原始结果
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: f64,
}

#[derive(Debug, Clone)]
pub struct CachedCredential {
    pub token: String,
    pub expires_at: Instant,
}

impl CachedCredential {
    /// `expires_at = issued_at + max(expires_in - 60s, 0)`
    pub fn from_grant(grant: TokenGrant, issued_at: Instant) -> Self {
        let window_ms = SAFETY_WINDOW.as_millis() as f64;
        let lifetime_ms = (grant.expires_in * 1000.0 - window_ms).max(0.0);
        let lifetime = Duration::from_millis(lifetime_ms as u64).min(MAX_TOKEN_LIFETIME);

        Self {
            token: grant.access_token,
            expires_at: issued_at + lifetime,
        }
    }

    pub fn is_usable_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// 单个上游的 bearer 令牌缓存。
///
/// 刷新在锁内完成，同一时间只有一个请求在做凭据交换，其余请求等待它的结果。
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedCredential>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_refresh<F, Fut>(
        &self,
        force_refresh: bool,
        refresh: F,
    ) -> Result<String, NutritionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenGrant, NutritionError>>,
    {
        let mut slot = self.slot.lock().await;
        let now = Instant::now();

        if !force_refresh {
            if let Some(cached) = slot.as_ref().filter(|c| c.is_usable_at(now)) {
                return Ok(cached.token.clone());
            }
        }

        let credential = CachedCredential::from_grant(refresh().await?, now);
        let token = credential.token.clone();
        *slot = Some(credential);
        tracing::debug!("Cached new upstream access token");
        Ok(token)
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
