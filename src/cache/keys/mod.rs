/// 缓存键模块
/// 提供各种缓存键生成函数

// 限流缓存键模块
pub mod rate_limit_keys;

// 重新导出常用的键生成函数
pub use rate_limit_keys::{RATE_LIMIT_NAMESPACE, rate_limit_key};
