use std::collections::HashMap;
use std::sync::Arc;

use super::dispatcher::Resource;
use super::error::ResourceError;

/// 已注册资源，按 (version, namespace, name) 查找
#[derive(Default)]
pub struct ResourceRegistry {
    resources: HashMap<(String, String, String), Arc<Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        namespace: &str,
        name: &str,
        resource: Resource,
        version: &str,
    ) -> Result<(), ResourceError> {
        let key = (version.to_string(), namespace.to_string(), name.to_string());
        if self.resources.contains_key(&key) {
            return Err(ResourceError::Config(format!(
                "resource {}/{}/{} registered twice",
                version, namespace, name
            )));
        }

        tracing::info!(
            "Registered resource {} at {}/{}/{}",
            resource.name(),
            version,
            namespace,
            name
        );
        self.resources.insert(key, Arc::new(resource));
        Ok(())
    }

    pub fn get(&self, version: &str, namespace: &str, name: &str) -> Option<Arc<Resource>> {
        self.resources
            .get(&(version.to_string(), namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::resource::{ResourceConfig, handler_fn};

    fn sample() -> Resource {
        let config = ResourceConfig::builder("Sample")
            .allowed_methods(["filter"])
            .build()
            .unwrap();
        Resource::builder(config)
            .handle("filter", handler_fn(|_, _| async { Ok(Value::Null) }))
            .build()
            .unwrap()
    }

    #[test]
    fn lookup_by_version_namespace_and_name() {
        let mut registry = ResourceRegistry::new();
        registry.register("test", "samples", sample(), "v1").unwrap();

        assert!(registry.get("v1", "test", "samples").is_some());
        assert!(registry.get("v2", "test", "samples").is_none());
        assert!(registry.get("v1", "test", "other").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_is_a_config_error() {
        let mut registry = ResourceRegistry::new();
        registry.register("test", "samples", sample(), "v1").unwrap();
        let err = registry.register("test", "samples", sample(), "v1").unwrap_err();
        assert!(matches!(err, ResourceError::Config(_)));
    }
}
