use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use todo_backend::cache::{CounterStore, MemoryCounterStore, StoreError};
use todo_backend::resource::{
    Dispatcher, Identity, Resource, ResourceConfig, ResourceError, handler_fn, permissions,
};

/// 所有操作都失败的存储
struct UnavailableStore;

#[async_trait]
impl CounterStore for UnavailableStore {
    async fn get_or_init(&self, _key: &str, _initial: i64, _ttl: Duration) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn decrement(&self, _key: &str) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

fn echo_resource(config: ResourceConfig) -> Resource {
    let mut builder = Resource::builder(config.clone());
    for method in config.allowed_methods() {
        let name = method.to_string();
        builder = builder.handle(
            method,
            handler_fn(move |identity, args| {
                let name = name.clone();
                async move { Ok(json!({ "method": name, "identity": identity.to_string(), "args": args })) }
            }),
        );
    }
    builder.build().unwrap()
}

fn memory_dispatcher() -> (Dispatcher, Arc<MemoryCounterStore>) {
    let store = Arc::new(MemoryCounterStore::new());
    (Dispatcher::new(store.clone()), store)
}

#[tokio::test(start_paused = true)]
async fn quota_window_scenario() {
    let (dispatcher, _) = memory_dispatcher();
    let resource = echo_resource(
        ResourceConfig::builder("Scenario")
            .allowed_methods(["filter", "update"])
            .rate_limit("1/1", ["filter"])
            .build()
            .unwrap(),
    );
    let identity = Identity::Account(1);

    let first = dispatcher.dispatch(&resource, &identity, "filter", Value::Null).await;
    assert_eq!(first.status_code, 200);
    assert_eq!(first.data.unwrap()["method"], "filter");

    let second = dispatcher.dispatch(&resource, &identity, "filter", Value::Null).await;
    assert_eq!(second.status_code, 403);
    assert_eq!(second.data, Some(json!({ "error": "forbidden" })));

    for _ in 0..5 {
        let update = dispatcher.dispatch(&resource, &identity, "update", Value::Null).await;
        assert_eq!(update.status_code, 200);
    }

    tokio::time::advance(Duration::from_secs(1)).await;
    let third = dispatcher.dispatch(&resource, &identity, "filter", Value::Null).await;
    assert_eq!(third.status_code, 200);
}

#[tokio::test]
async fn denied_authorization_does_not_consume_quota() {
    let (dispatcher, store) = memory_dispatcher();
    let quota = 3;
    let rate = format!("{}/60", quota);

    let locked = echo_resource(
        ResourceConfig::builder("Guarded")
            .allowed_methods(["filter"])
            .predicate(|_| false)
            .rate_limit(rate.clone(), ["filter"])
            .build()
            .unwrap(),
    );
    let open = echo_resource(
        ResourceConfig::builder("Guarded")
            .allowed_methods(["filter"])
            .predicate(permissions::allow_any)
            .rate_limit(rate, ["filter"])
            .build()
            .unwrap(),
    );
    let identity = Identity::Account(7);

    for _ in 0..=quota {
        let envelope = dispatcher.dispatch(&locked, &identity, "filter", Value::Null).await;
        assert_eq!(envelope.status_code, 403);
    }
    assert!(store.is_empty());

    for _ in 0..quota {
        let envelope = dispatcher.dispatch(&open, &identity, "filter", Value::Null).await;
        assert_eq!(envelope.status_code, 200);
    }
    let envelope = dispatcher.dispatch(&open, &identity, "filter", Value::Null).await;
    assert_eq!(envelope.status_code, 403);
}

#[tokio::test]
async fn login_required_method_scenario() {
    let (dispatcher, _) = memory_dispatcher();
    let resource = echo_resource(
        ResourceConfig::builder("MethodLoginRequired")
            .allowed_methods(["filter", "get_pk"])
            .login_required_methods(["filter"])
            .build()
            .unwrap(),
    );
    let anonymous = Identity::Anonymous;
    let user = Identity::Account(2);

    assert_eq!(dispatcher.dispatch(&resource, &anonymous, "filter", Value::Null).await.status_code, 403);
    assert_eq!(dispatcher.dispatch(&resource, &user, "filter", Value::Null).await.status_code, 200);
    assert_eq!(dispatcher.dispatch(&resource, &anonymous, "get_pk", Value::Null).await.status_code, 200);
    assert_eq!(dispatcher.dispatch(&resource, &user, "get_pk", Value::Null).await.status_code, 200);
}

#[tokio::test]
async fn unknown_method_is_not_found_regardless_of_state() {
    let (dispatcher, _) = memory_dispatcher();
    let resource = echo_resource(
        ResourceConfig::builder("Strict")
            .allowed_methods(["get_pk"])
            .predicate(|_| false)
            .rate_limit("1/60", ["filter", "get_pk"])
            .build()
            .unwrap(),
    );

    for identity in [Identity::Anonymous, Identity::Account(1)] {
        for _ in 0..3 {
            let envelope = dispatcher.dispatch(&resource, &identity, "filter", Value::Null).await;
            assert_eq!(envelope.status_code, 404);
            assert_eq!(envelope.data, Some(json!({ "error": "unknown method" })));
        }
    }
}

#[tokio::test]
async fn store_outage_fails_open() {
    let dispatcher = Dispatcher::new(Arc::new(UnavailableStore));
    let resource = echo_resource(
        ResourceConfig::builder("Outage")
            .allowed_methods(["filter"])
            .rate_limit("1/60", ["filter"])
            .build()
            .unwrap(),
    );

    for _ in 0..3 {
        let envelope = dispatcher.dispatch(&resource, &Identity::Account(1), "filter", Value::Null).await;
        assert_eq!(envelope.status_code, 200);
    }
}

#[tokio::test]
async fn store_outage_never_bypasses_authorization() {
    let dispatcher = Dispatcher::new(Arc::new(UnavailableStore));
    let resource = echo_resource(
        ResourceConfig::builder("Outage")
            .allowed_methods(["filter"])
            .predicate(permissions::login_required)
            .rate_limit("1/60", ["filter"])
            .build()
            .unwrap(),
    );

    let envelope = dispatcher.dispatch(&resource, &Identity::Anonymous, "filter", Value::Null).await;
    assert_eq!(envelope.status_code, 403);
}

#[tokio::test]
async fn handler_failures_are_normalized() {
    let (dispatcher, _) = memory_dispatcher();
    let config = ResourceConfig::builder("Failing")
        .allowed_methods(["create", "get_pk", "update", "delete"])
        .build()
        .unwrap();
    let resource = Resource::builder(config)
        .handle(
            "create",
            handler_fn(|_, _| async { Err(ResourceError::invalid("title", "This field is required.")) }),
        )
        .handle("get_pk", handler_fn(|_, _| async { Err(ResourceError::NotFound) }))
        .handle(
            "update",
            handler_fn(|_, _| async { Err(ResourceError::Unexpected("deadlock detected in table tasks".into())) }),
        )
        .handle(
            "delete",
            handler_fn(|_, args: Value| async move {
                if args.is_null() {
                    panic!("handler blew up");
                }
                Ok(Value::Null)
            }),
        )
        .build()
        .unwrap();
    let identity = Identity::Account(1);

    let validation = dispatcher.dispatch(&resource, &identity, "create", Value::Null).await;
    assert_eq!(validation.status_code, 400);
    assert_eq!(
        validation.data,
        Some(json!({ "errors": { "title": ["This field is required."] } }))
    );

    let missing = dispatcher.dispatch(&resource, &identity, "get_pk", Value::Null).await;
    assert_eq!(missing.status_code, 404);

    let unexpected = dispatcher.dispatch(&resource, &identity, "update", Value::Null).await;
    assert_eq!(unexpected.status_code, 500);
    assert!(!unexpected.data.unwrap().to_string().contains("deadlock"));

    let panicked = dispatcher.dispatch(&resource, &identity, "delete", Value::Null).await;
    assert_eq!(panicked.status_code, 500);
}

#[tokio::test]
async fn handler_receives_identity_and_args() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let (dispatcher, _) = memory_dispatcher();
    let resource = Resource::builder(
        ResourceConfig::builder("Echo")
            .allowed_methods(["get_pk"])
            .build()
            .unwrap(),
    )
    .handle(
        "get_pk",
        handler_fn(move |identity, args| {
            counted.fetch_add(1, Ordering::SeqCst);
            async move { Ok(json!({ "caller": identity.account_id(), "pk": args["pk"] })) }
        }),
    )
    .build()
    .unwrap();

    let envelope = dispatcher
        .dispatch(&resource, &Identity::Account(11), "get_pk", json!({ "pk": 5 }))
        .await;
    assert_eq!(envelope.data, Some(json!({ "caller": 11, "pk": 5 })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn allowed_methods_need_handlers() {
    let config = ResourceConfig::builder("Incomplete")
        .allowed_methods(["filter", "delete"])
        .build()
        .unwrap();
    let err = Resource::builder(config)
        .handle("filter", handler_fn(|_, _| async { Ok(Value::Null) }))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ResourceError::Config(message) if message.contains("delete")));
}
