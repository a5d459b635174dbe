use std::sync::Arc;

use cache::CounterStore;
use config::Config;
use database::Repositories;
use resource::{Dispatcher, ResourceError, ResourceRegistry};

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod resource;
pub mod router;
pub mod routes;
pub mod task;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub dispatcher: Arc<Dispatcher>,
    pub registry: Arc<ResourceRegistry>,
    pub repositories: Repositories,
}

impl AppState {
    /// 注册全部资源；限流字符串不合法时在这里失败，而不是等到请求时
    pub fn new(
        config: Config,
        store: Arc<dyn CounterStore>,
        repositories: Repositories,
    ) -> Result<Self, ResourceError> {
        let mut registry = ResourceRegistry::new();
        task::register_resources(&mut registry, &repositories, &config)?;

        Ok(Self {
            config,
            dispatcher: Arc::new(Dispatcher::new(store)),
            registry: Arc::new(registry),
            repositories,
        })
    }
}
