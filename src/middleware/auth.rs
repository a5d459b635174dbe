use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, resource::Identity, utils::verify_token};

/// 解析 `Authorization: Bearer <token>`，把调用方身份放进请求扩展
///
/// 这里从不拒绝请求：没有令牌或令牌无效时身份为匿名，是否放行由资源的授权检查决定。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let identity: Identity = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .and_then(|auth| match verify_token(auth.token(), &state.config) {
            Ok(claims) => Some(claims.identity()),
            Err(e) => {
                tracing::debug!("Rejected bearer token: {}", e);
                None
            }
        })
        .unwrap_or_default();

    req.extensions_mut().insert(identity);
    next.run(req).await
}
