use axum::{
    Router,
    routing::{get, post},
};

use serde_json::json;

use crate::{
    AppState,
    middleware::{auth_middleware, log_requests},
    resource::Envelope,
    routes,
};

// 账号相关的路由
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(routes::user::register))
        .route("/auth/login", post(routes::user::login))
}

// 资源路由：列表与详情
fn resource_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{version}/{namespace}/{name}",
            get(routes::resource::filter).post(routes::resource::create),
        )
        .route(
            "/{version}/{namespace}/{name}/{pk}",
            get(routes::resource::retrieve)
                .put(routes::resource::update)
                .delete(routes::resource::destroy),
        )
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(user_routes())
        .merge(resource_routes())
        .method_not_allowed_fallback(method_not_allowed)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // axum 不允许在根路径上 nest
    let base_uri = state.config.api_base_uri.trim_end_matches('/');
    let router = if base_uri.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(base_uri, api)
    };

    router
        .fallback(not_found)
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(state)
}

// 未匹配的路径同样返回统一结果
async fn not_found() -> Envelope {
    Envelope::not_found()
}

async fn method_not_allowed() -> Envelope {
    Envelope::error(405, json!({ "error": "method not allowed" }))
}
