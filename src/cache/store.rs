use std::time::Duration;

use async_trait::async_trait;

/// 计数器存储错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 键不存在或已过期
    #[error("counter not found: {0}")]
    NotFound(String),

    /// 后端不可用（连接失败、脚本执行失败等）
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// 共享计数器存储
///
/// 同一个键上的操作必须是线性一致的；不同键之间没有顺序要求。
/// 进程启动时构造一次，以 `Arc<dyn CounterStore>` 的形式在所有分发器之间共享。
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// 返回未过期计数器的当前值；不存在时以 `initial` 和 `ttl` 原子地创建并返回 `initial`
    async fn get_or_init(&self, key: &str, initial: i64, ttl: Duration) -> Result<i64, StoreError>;

    /// 原子地减一并返回新值；键不存在或已过期时返回 `StoreError::NotFound`
    async fn decrement(&self, key: &str) -> Result<i64, StoreError>;
}
