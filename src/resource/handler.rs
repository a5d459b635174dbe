use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::error::ResourceError;
use super::identity::Identity;

/// 绑定到资源方法上的处理函数，是通往记录存储的接缝
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, identity: &Identity, args: Value) -> Result<Value, ResourceError>;
}

/// 把闭包包装成 [`Handler`]
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Identity, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ResourceError>> + Send + 'static,
{
    async fn call(&self, identity: &Identity, args: Value) -> Result<Value, ResourceError> {
        (self.f)(*identity, args).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Identity, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ResourceError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
