use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// 统一的调用结果
///
/// 无论成功还是被拒绝，每次分发都返回一个 `Envelope`；`status_code` 沿用 HTTP 语义，
/// 但核心逻辑本身不依赖 HTTP。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status_code: u16,
    pub data: Option<Value>,
}

impl Envelope {
    /// 成功结果；`Value::Null` 表示没有数据
    pub fn ok(data: Value) -> Self {
        Self {
            status_code: 200,
            data: (!data.is_null()).then_some(data),
        }
    }

    pub fn error(status_code: u16, data: Value) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }

    /// 固定的拒绝结果，不透露是哪一项检查失败
    pub fn forbidden() -> Self {
        Self::error(403, json!({ "error": "forbidden" }))
    }

    pub fn not_found() -> Self {
        Self::error(404, json!({ "error": "not found" }))
    }

    pub fn bad_request(message: &str) -> Self {
        Self::error(400, json!({ "error": message }))
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
