use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, error, info_span};
use uuid::Uuid;

// 读取错误响应体的上限
const MAX_LOGGED_BODY: usize = 64 * 1024;

/// 为每个请求建立带 request_id 的 span，记录耗时，并把 5xx 响应体写入错误日志
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "request",
        %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let started = Instant::now();
        let response = next.run(req).await;
        let status = response.status();
        tracing::info!(status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "Request completed");

        if !status.is_server_error() {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to read error response body: {}", e);
                return Response::from_parts(parts, Body::empty());
            }
        };

        error!(
            "Server error occurred - Status: {}, Body: {}",
            parts.status,
            String::from_utf8_lossy(&bytes)
        );

        // 重置body以便重新构建响应
        parts.headers.remove(header::CONTENT_LENGTH);
        Response::from_parts(parts, Body::from(bytes))
    }
    .instrument(span)
    .await
}
