use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::resource::Envelope;

pub mod resource;
pub mod user;

/// 把请求体解析为 JSON 对象，空请求体视为空对象
///
/// 不依赖 `Content-Type`，失败时直接返回 400 的 [`Envelope`]，不把反序列化细节暴露给调用方。
pub(crate) fn parse_body(body: &Bytes) -> Result<Map<String, Value>, Envelope> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Envelope::bad_request("request body must be a JSON object")),
        Err(e) => {
            tracing::debug!("Malformed request body: {}", e);
            Err(Envelope::bad_request("malformed JSON body"))
        }
    }
}
