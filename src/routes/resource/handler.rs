use std::collections::HashMap;

use axum::{
    Extension,
    body::Bytes,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::routes::parse_body;
use crate::{
    AppState,
    resource::{
        Envelope, Identity,
        methods::{CREATE, DELETE, FILTER, GET_PK, UPDATE},
    },
};

#[derive(Debug, Deserialize)]
pub struct ResourcePath {
    pub version: String,
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailPath {
    pub version: String,
    pub namespace: String,
    pub name: String,
    pub pk: String,
}

/// GET 列表 -> filter，查询参数作为调用参数
pub async fn filter(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(path): Path<ResourcePath>,
    Query(query): Query<HashMap<String, String>>,
) -> Envelope {
    let args: Map<String, Value> = query
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    dispatch(&state, &identity, &path.version, &path.namespace, &path.name, FILTER, Value::Object(args)).await
}

/// POST 列表 -> create
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(path): Path<ResourcePath>,
    body: Bytes,
) -> Envelope {
    let args = match parse_body(&body) {
        Ok(args) => args,
        Err(envelope) => return envelope,
    };

    dispatch(&state, &identity, &path.version, &path.namespace, &path.name, CREATE, Value::Object(args)).await
}

/// GET 详情 -> get_pk
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(path): Path<DetailPath>,
) -> Envelope {
    let args = pk_args(Map::new(), path.pk);
    dispatch(&state, &identity, &path.version, &path.namespace, &path.name, GET_PK, args).await
}

/// PUT 详情 -> update，路径中的主键覆盖请求体中的同名字段
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(path): Path<DetailPath>,
    body: Bytes,
) -> Envelope {
    let args = match parse_body(&body) {
        Ok(args) => pk_args(args, path.pk),
        Err(envelope) => return envelope,
    };

    dispatch(&state, &identity, &path.version, &path.namespace, &path.name, UPDATE, args).await
}

/// DELETE 详情 -> delete
pub async fn destroy(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(path): Path<DetailPath>,
) -> Envelope {
    let args = pk_args(Map::new(), path.pk);
    dispatch(&state, &identity, &path.version, &path.namespace, &path.name, DELETE, args).await
}

async fn dispatch(
    state: &AppState,
    identity: &Identity,
    version: &str,
    namespace: &str,
    name: &str,
    method: &str,
    args: Value,
) -> Envelope {
    let Some(resource) = state.registry.get(version, namespace, name) else {
        tracing::debug!("No resource registered at {}/{}/{}", version, namespace, name);
        return Envelope::not_found();
    };

    state.dispatcher.dispatch(&resource, identity, method, args).await
}

fn pk_args(mut args: Map<String, Value>, pk: String) -> Value {
    args.insert("pk".to_string(), Value::String(pk));
    Value::Object(args)
}
