/// 缓存操作
/// 提供计数器存储的具体实现

// 进程内实现
pub mod memory;

// Redis 实现
pub mod rate_limit;

// 重新导出常用操作
pub use memory::MemoryCounterStore;
pub use rate_limit::RedisCounterStore;
