use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::keys::rate_limit_key;
use crate::cache::{CounterStore, StoreError};

use super::config::ResourceConfig;
use super::error::ResourceError;
use super::identity::Identity;

/// 限流规则：窗口内最多 `quota` 次调用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSpec {
    pub quota: u32,
    pub window_secs: u64,
}

impl RateLimitSpec {
    pub fn new(quota: u32, window_secs: u64) -> Self {
        Self { quota, window_secs }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl FromStr for RateLimitSpec {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_spec(s)
    }
}

/// 解析 `"<quota>/<window>"` 形式的限流字符串，两者都必须是正整数
pub fn resolve_spec(rate: &str) -> Result<RateLimitSpec, ResourceError> {
    let invalid = || ResourceError::Config(format!("invalid rate limit `{}`", rate));

    let (quota, window) = rate.split_once('/').ok_or_else(invalid)?;
    let quota: u32 = quota.trim().parse().map_err(|_| invalid())?;
    let window_secs: u64 = window.trim().parse().map_err(|_| invalid())?;

    if quota == 0 || window_secs == 0 {
        return Err(invalid());
    }

    Ok(RateLimitSpec::new(quota, window_secs))
}

/// 按身份和方法限流
///
/// 计数器以配额为初值，包括创建窗口的那一次在内每次调用都减一，
/// 减一后的值不小于 0 即放行。窗口从每个键的第一次调用开始计时。
///
/// 存储出错时放行（fail open）：限流让位于可用性，授权检查从不这样处理。
#[derive(Clone)]
pub struct RateLimitGate {
    store: Arc<dyn CounterStore>,
}

impl RateLimitGate {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub fn build_cache_key(identity: &Identity, resource_name: &str, method: &str) -> String {
        rate_limit_key(resource_name, method, &identity.to_string())
    }

    /// 方法受限时返回资源的限流规则
    pub fn spec_for(config: &ResourceConfig, method: &str) -> Option<RateLimitSpec> {
        if config.is_rate_limited(method) {
            config.rate_spec()
        } else {
            None
        }
    }

    /// 检查配额并消耗一次；被拒绝时计数器可能变为负数，窗口过期前不会再被读取
    pub async fn check_and_consume(
        &self,
        identity: &Identity,
        config: &ResourceConfig,
        method: &str,
    ) -> bool {
        let Some(spec) = Self::spec_for(config, method) else {
            return true;
        };
        let key = Self::build_cache_key(identity, config.name(), method);

        if let Err(e) = self
            .store
            .get_or_init(&key, i64::from(spec.quota), spec.window())
            .await
        {
            tracing::warn!(key = %key, error = %e, "Rate limit store unavailable, allowing request");
            return true;
        }

        match self.store.decrement(&key).await {
            Ok(remaining) if remaining >= 0 => {
                tracing::debug!(key = %key, remaining, "Rate limit check passed");
                true
            }
            Ok(remaining) => {
                tracing::debug!(key = %key, remaining, "Rate limit exceeded");
                false
            }
            Err(StoreError::NotFound(_)) => {
                // 两次存储调用之间窗口恰好过期
                tracing::debug!(key = %key, "Rate limit window expired mid-check, allowing request");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Rate limit decrement failed, allowing request");
                true
            }
        }
    }
}
