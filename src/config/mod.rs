use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// 未设置时使用进程内存储
    pub database_url: Option<String>,
    /// 未设置时使用进程内限流计数器
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub task_rate_limit: String,
    pub custom_list_rate_limit: String,
    pub counter_purge_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration = optional_var("JWT_EXPIRATION")
            .and_then(|v| v.trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(24);

        Ok(Config {
            server_host: optional_var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: optional_var("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            api_base_uri: optional_var("API_BASE_URI").unwrap_or_else(|| "/api".into()),
            database_url: optional_var("DATABASE_URL"),
            redis_url: optional_var("REDIS_URL"),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            task_rate_limit: optional_var("TASK_RATE_LIMIT").unwrap_or_else(|| "60/60".into()),
            custom_list_rate_limit: optional_var("CUSTOM_LIST_RATE_LIMIT")
                .unwrap_or_else(|| "30/60".into()),
            counter_purge_interval_secs: optional_var("COUNTER_PURGE_INTERVAL")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(60),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn counter_purge_interval(&self) -> Duration {
        Duration::from_secs(self.counter_purge_interval_secs)
    }
}

// 空字符串视为未设置
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
