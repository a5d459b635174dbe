use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::cache::models::rate_limit::CounterEntry;
use crate::cache::store::{CounterStore, StoreError};

/// 进程内计数器存储
///
/// 过期在访问时惰性判断，`purge_expired` 负责回收不再被访问的条目。
/// 锁只在同步代码段内持有，不跨越 await。
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 删除所有已过期的条目，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// 获取未过期条目的快照
    pub fn entry(&self, key: &str) -> Option<CounterEntry> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .cloned()
    }

    /// 当前保存的条目数（包括尚未回收的过期条目）
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 启动后台定时回收任务
    pub fn spawn_purge(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Purged expired rate limit counters");
                }
            }
        })
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get_or_init(&self, key: &str, initial: i64, ttl: Duration) -> Result<i64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(key).filter(|entry| !entry.is_expired(now)) {
            return Ok(entry.remaining);
        }

        entries.insert(key.to_string(), CounterEntry::new(key, initial, ttl));
        Ok(initial)
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(key).filter(|entry| !entry.is_expired(now)) {
            entry.remaining -= 1;
            return Ok(entry.remaining);
        }

        entries.remove(key);
        Err(StoreError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_init_creates_once() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(10);

        assert_eq!(store.get_or_init("k", 3, ttl).await.unwrap(), 3);
        assert_eq!(store.decrement("k").await.unwrap(), 2);
        // 已存在的键返回当前值，不会重新初始化
        assert_eq!(store.get_or_init("k", 3, ttl).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn decrement_missing_key_is_not_found() {
        let store = MemoryCounterStore::new();
        let err = store.decrement("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(key) if key == "missing"));
    }

    #[tokio::test]
    async fn counter_may_go_negative() {
        let store = MemoryCounterStore::new();
        store.get_or_init("k", 1, Duration::from_secs(10)).await.unwrap();
        assert_eq!(store.decrement("k").await.unwrap(), 0);
        assert_eq!(store.decrement("k").await.unwrap(), -1);
        assert_eq!(store.entry("k").unwrap().remaining, -1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(2);
        store.get_or_init("k", 5, ttl).await.unwrap();
        store.decrement("k").await.unwrap();

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert_eq!(store.get_or_init("k", 5, ttl).await.unwrap(), 4);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(store.entry("k").is_none());
        assert!(matches!(store.decrement("k").await, Err(StoreError::NotFound(_))));
        assert_eq!(store.get_or_init("k", 5, ttl).await.unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired_entries() {
        let store = MemoryCounterStore::new();
        store.get_or_init("short", 1, Duration::from_secs(1)).await.unwrap();
        store.get_or_init("long", 1, Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.entry("long").is_some());
    }

    #[tokio::test]
    async fn concurrent_decrements_are_not_lost() {
        let store = Arc::new(MemoryCounterStore::new());
        store.get_or_init("k", 100, Duration::from_secs(60)).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move { store.decrement("k").await.unwrap() }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.entry("k").unwrap().remaining, 50);
    }
}
