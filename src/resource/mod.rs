//! 资源框架
//!
//! 以声明式配置把一组记录操作（`filter`、`get_pk`、`create`、`update`、`delete`）
//! 暴露为资源：每次调用依次经过授权检查、按方法限流，再执行绑定的处理函数，
//! 结果统一包装成 [`Envelope`]。

pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod identity;
pub mod permissions;
pub mod rate_limit;
pub mod registry;

pub use auth::AuthorizationGate;
pub use config::{Predicate, ResourceConfig, ResourceConfigBuilder};
pub use dispatcher::{Dispatcher, Resource, ResourceBuilder};
pub use envelope::Envelope;
pub use error::{FieldErrors, ResourceError};
pub use handler::{Handler, handler_fn};
pub use identity::Identity;
pub use rate_limit::{RateLimitGate, RateLimitSpec, resolve_spec};
pub use registry::ResourceRegistry;

/// 资源的标准方法名
pub mod methods {
    pub const FILTER: &str = "filter";
    pub const GET_PK: &str = "get_pk";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";

    pub const ALL: [&str; 5] = [FILTER, GET_PK, CREATE, UPDATE, DELETE];
}
