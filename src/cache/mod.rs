// 缓存模块
// 包含限流计数器的存储接口、数据结构和具体实现

pub mod keys;
pub mod models;
pub mod operations;
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use models::rate_limit::CounterEntry;
pub use operations::{MemoryCounterStore, RedisCounterStore};
pub use store::{CounterStore, StoreError};
