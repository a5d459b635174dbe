use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;

use crate::cache::CounterStore;

use super::auth::AuthorizationGate;
use super::config::ResourceConfig;
use super::envelope::Envelope;
use super::error::ResourceError;
use super::handler::Handler;
use super::identity::Identity;
use super::rate_limit::RateLimitGate;

/// 配置加上方法到处理函数的映射
pub struct Resource {
    config: ResourceConfig,
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl Resource {
    pub fn builder(config: ResourceConfig) -> ResourceBuilder {
        ResourceBuilder {
            config,
            handlers: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        self.config.name()
    }

    fn handler(&self, method: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(method)
    }
}

pub struct ResourceBuilder {
    config: ResourceConfig,
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl ResourceBuilder {
    pub fn handle(mut self, method: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(method.into(), handler);
        self
    }

    /// 每个允许的方法都必须绑定处理函数
    pub fn build(self) -> Result<Resource, ResourceError> {
        let mut missing: Vec<&str> = self
            .config
            .allowed_methods()
            .filter(|method| !self.handlers.contains_key(*method))
            .collect();

        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(ResourceError::Config(format!(
                "{}: no handler bound for {}",
                self.config.name(),
                missing.join(", ")
            )));
        }

        Ok(Resource {
            config: self.config,
            handlers: self.handlers,
        })
    }
}

/// 请求入口
///
/// 顺序固定为：方法检查 -> 授权 -> 限流 -> 处理函数。
/// 授权在限流之前，因此被拒绝的请求不会消耗配额。
#[derive(Clone)]
pub struct Dispatcher {
    auth: AuthorizationGate,
    rate_limit: RateLimitGate,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            auth: AuthorizationGate::new(),
            rate_limit: RateLimitGate::new(store),
        }
    }

    pub async fn dispatch(
        &self,
        resource: &Resource,
        identity: &Identity,
        method: &str,
        args: Value,
    ) -> Envelope {
        match self.try_dispatch(resource, identity, method, args).await {
            Ok(data) => Envelope::ok(data),
            Err(e) => {
                tracing::debug!(
                    resource = resource.name(),
                    method,
                    identity = %identity,
                    error = %e,
                    "Resource call rejected"
                );
                e.into_envelope()
            }
        }
    }

    async fn try_dispatch(
        &self,
        resource: &Resource,
        identity: &Identity,
        method: &str,
        args: Value,
    ) -> Result<Value, ResourceError> {
        let config = resource.config();

        if !config.allows(method) {
            return Err(ResourceError::UnknownMethod(method.to_string()));
        }
        let handler = resource
            .handler(method)
            .ok_or_else(|| ResourceError::UnknownMethod(method.to_string()))?;

        if !self.auth.evaluate(identity, config, method) {
            return Err(ResourceError::Forbidden);
        }

        if !self.rate_limit.check_and_consume(identity, config, method).await {
            return Err(ResourceError::RateLimited);
        }

        match AssertUnwindSafe(handler.call(identity, args))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ResourceError::Unexpected(format!(
                "{}.{} handler panicked",
                resource.name(),
                method
            ))),
        }
    }
}
