/// 限流计数器缓存键前缀
pub const RATE_LIMIT_NAMESPACE: &str = "resource_ratelimit";

/// 生成限流计数器缓存键
///
/// 格式：`<namespace>_<resource>_<method>_<identity>`，同一三元组在窗口内保持不变。
pub fn rate_limit_key(resource_name: &str, method: &str, identity: &str) -> String {
    format!(
        "{}_{}_{}_{}",
        RATE_LIMIT_NAMESPACE, resource_name, method, identity
    )
}
