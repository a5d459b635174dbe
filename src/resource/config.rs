use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::error::ResourceError;
use super::identity::Identity;
use super::rate_limit::{RateLimitSpec, resolve_spec};

/// 资源级权限谓词
pub type Predicate = Arc<dyn Fn(&Identity) -> bool + Send + Sync>;

/// 每次 `filter` 返回的默认最大记录数
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// 资源的声明式配置
///
/// 通过 [`ResourceConfig::builder`] 构造，限流字符串在 `build` 时解析一次。
#[derive(Clone)]
pub struct ResourceConfig {
    name: String,
    allowed_methods: HashSet<String>,
    rate_limited_methods: HashSet<String>,
    rate_spec: Option<RateLimitSpec>,
    login_required_methods: HashSet<String>,
    predicates: Vec<Predicate>,
    page_size: usize,
}

impl ResourceConfig {
    pub fn builder(name: impl Into<String>) -> ResourceConfigBuilder {
        ResourceConfigBuilder {
            name: name.into(),
            allowed_methods: HashSet::new(),
            rate_limited_methods: HashSet::new(),
            rate: None,
            login_required_methods: HashSet::new(),
            predicates: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allows(&self, method: &str) -> bool {
        self.allowed_methods.contains(method)
    }

    pub fn allowed_methods(&self) -> impl Iterator<Item = &str> {
        self.allowed_methods.iter().map(String::as_str)
    }

    pub fn is_rate_limited(&self, method: &str) -> bool {
        self.rate_limited_methods.contains(method)
    }

    pub fn rate_spec(&self) -> Option<RateLimitSpec> {
        self.rate_spec
    }

    pub fn requires_login(&self, method: &str) -> bool {
        self.login_required_methods.contains(method)
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl fmt::Debug for ResourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceConfig")
            .field("name", &self.name)
            .field("allowed_methods", &self.allowed_methods)
            .field("rate_limited_methods", &self.rate_limited_methods)
            .field("rate_spec", &self.rate_spec)
            .field("login_required_methods", &self.login_required_methods)
            .field("predicates", &self.predicates.len())
            .field("page_size", &self.page_size)
            .finish()
    }
}

pub struct ResourceConfigBuilder {
    name: String,
    allowed_methods: HashSet<String>,
    rate_limited_methods: HashSet<String>,
    rate: Option<String>,
    login_required_methods: HashSet<String>,
    predicates: Vec<Predicate>,
    page_size: usize,
}

impl ResourceConfigBuilder {
    pub fn allowed_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// 以 `"<quota>/<window>"` 形式声明限流，并指定受限的方法
    pub fn rate_limit<I, S>(mut self, rate: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rate = Some(rate.into());
        self.rate_limited_methods
            .extend(methods.into_iter().map(Into::into));
        self
    }

    pub fn login_required_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.login_required_methods
            .extend(methods.into_iter().map(Into::into));
        self
    }

    /// 追加资源级谓词，按添加顺序求值
    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Identity) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Arc::new(predicate));
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn build(self) -> Result<ResourceConfig, ResourceError> {
        let rate_spec = self.rate.as_deref().map(resolve_spec).transpose()?;

        if self.page_size == 0 {
            return Err(ResourceError::Config(format!(
                "{}: page size must be positive",
                self.name
            )));
        }

        Ok(ResourceConfig {
            name: self.name,
            allowed_methods: self.allowed_methods,
            rate_limited_methods: self.rate_limited_methods,
            rate_spec,
            login_required_methods: self.login_required_methods,
            predicates: self.predicates,
            page_size: self.page_size,
        })
    }
}
