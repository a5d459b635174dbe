use super::config::ResourceConfig;
use super::identity::Identity;

/// 授权检查
///
/// 资源级谓词全部通过（按顺序，遇到第一个失败即停止），
/// 且调用的方法若要求登录则身份必须已认证。
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, identity: &Identity, config: &ResourceConfig, method: &str) -> bool {
        if !config.predicates().iter().all(|predicate| predicate(identity)) {
            return false;
        }

        !(config.requires_login(method) && !identity.is_authenticated())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::resource::permissions;

    #[test]
    fn login_required_predicate_applies_to_every_method() {
        let config = ResourceConfig::builder("Tasks")
            .allowed_methods(["filter", "get_pk"])
            .predicate(permissions::login_required)
            .build()
            .unwrap();
        let gate = AuthorizationGate::new();

        assert!(!gate.evaluate(&Identity::Anonymous, &config, "filter"));
        assert!(!gate.evaluate(&Identity::Anonymous, &config, "get_pk"));
        assert!(gate.evaluate(&Identity::Account(1), &config, "filter"));
    }

    #[test]
    fn per_method_login_requirement() {
        let config = ResourceConfig::builder("Samples")
            .allowed_methods(["filter", "get_pk"])
            .login_required_methods(["filter"])
            .build()
            .unwrap();
        let gate = AuthorizationGate::new();

        assert!(!gate.evaluate(&Identity::Anonymous, &config, "filter"));
        assert!(gate.evaluate(&Identity::Account(1), &config, "filter"));
        assert!(gate.evaluate(&Identity::Anonymous, &config, "get_pk"));
        assert!(gate.evaluate(&Identity::Account(1), &config, "get_pk"));
    }

    #[test]
    fn predicates_short_circuit_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let config = ResourceConfig::builder("Ordered")
            .allowed_methods(["filter"])
            .predicate(|_| false)
            .predicate(move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                true
            })
            .build()
            .unwrap();

        assert!(!AuthorizationGate::new().evaluate(&Identity::Account(1), &config, "filter"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
