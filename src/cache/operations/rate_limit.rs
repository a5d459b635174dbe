use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{Client as RedisClient, Script};

use crate::cache::store::{CounterStore, StoreError};

// 读取已有计数；不存在时带过期时间写入初始值
const GET_OR_INIT_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[1])
if current then
    return tonumber(current)
end
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
return tonumber(ARGV[1])
";

// DECR 会为不存在的键创建 -1，这里先判断是否存在
const DECREMENT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
return redis.call('DECR', KEYS[1])
";

/// Redis 限流计数器存储
///
/// 每个操作都是一段服务端 Lua 脚本，因此同一个键上的操作是原子的。
pub struct RedisCounterStore {
    redis: Arc<RedisClient>,
    get_or_init: Script,
    decrement: Script,
}

impl RedisCounterStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self {
            redis,
            get_or_init: Script::new(GET_OR_INIT_SCRIPT),
            decrement: Script::new(DECREMENT_SCRIPT),
        }
    }

    /// 通过连接串创建
    pub fn open(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = RedisClient::open(redis_url)?;
        Ok(Self::new(Arc::new(client)))
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get_or_init(&self, key: &str, initial: i64, ttl: Duration) -> Result<i64, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        // EX 不接受 0
        let ttl_secs = ttl.as_secs().max(1);
        let value: i64 = self
            .get_or_init
            .key(key)
            .arg(initial)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;

        Ok(value)
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let value: Option<i64> = self.decrement.key(key).invoke_async(&mut conn).await?;

        value.ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}
