use std::collections::BTreeMap;

use serde_json::json;

use super::envelope::Envelope;

/// 字段级校验错误：字段名 -> 错误信息列表
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// 不属于任何单个字段的错误使用的键
pub const NON_FIELD_ERRORS: &str = "__all__";

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// 资源注册时的配置错误（如限流字符串格式不正确）
    #[error("invalid resource configuration: {0}")]
    Config(String),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("forbidden")]
    Forbidden,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("record not found")]
    NotFound,

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ResourceError {
    /// 单个字段的校验错误
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ResourceError::Validation(errors)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ResourceError::UnknownMethod(_) | ResourceError::NotFound => 404,
            // 限流拒绝与授权拒绝使用同一个状态码
            ResourceError::Forbidden | ResourceError::RateLimited => 403,
            ResourceError::Validation(_) => 400,
            ResourceError::Config(_) | ResourceError::Unexpected(_) => 500,
        }
    }

    /// 转换为统一结果，内部错误细节只写日志
    pub fn into_envelope(self) -> Envelope {
        match self {
            ResourceError::UnknownMethod(_) => {
                Envelope::error(404, json!({ "error": "unknown method" }))
            }
            ResourceError::NotFound => Envelope::not_found(),
            ResourceError::Forbidden | ResourceError::RateLimited => Envelope::forbidden(),
            ResourceError::Validation(errors) => Envelope::error(400, json!({ "errors": errors })),
            ResourceError::Config(message) | ResourceError::Unexpected(message) => {
                tracing::error!("Resource call failed: {}", message);
                Envelope::error(500, json!({ "error": "internal server error" }))
            }
        }
    }
}

impl From<sqlx::Error> for ResourceError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ResourceError::NotFound,
            other => ResourceError::Unexpected(format!("database error: {}", other)),
        }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(e: serde_json::Error) -> Self {
        ResourceError::Unexpected(format!("serialization error: {}", e))
    }
}
