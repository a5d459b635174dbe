use std::time::Duration;

use tokio::time::Instant;

/// 限流计数器条目
///
/// 首次调用时以配额创建，窗口内每次调用原子减一，创建后 `ttl` 到期即失效。
#[derive(Debug, Clone)]
pub struct CounterEntry {
    pub key: String,
    pub remaining: i64,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl CounterEntry {
    pub fn new(key: &str, remaining: i64, ttl: Duration) -> Self {
        let created_at = Instant::now();
        Self {
            key: key.to_string(),
            remaining,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
