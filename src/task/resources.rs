use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::Config;
use crate::database::{CustomListRepository, Repositories, TaskRepository};
use crate::resource::error::NON_FIELD_ERRORS;
use crate::resource::methods::{ALL, CREATE, DELETE, FILTER, GET_PK, UPDATE};
use crate::resource::{
    Resource, ResourceConfig, ResourceError, ResourceRegistry, handler_fn, permissions,
};

use super::form::{clean_custom_list, clean_task, pk_from_args};

pub const API_VERSION: &str = "v1";
pub const TASK_PAGE_SIZE: usize = 50;
pub const CUSTOM_LIST_PAGE_SIZE: usize = 1;

/// 任务资源：所有方法都要求登录，写操作受限流
pub fn task_resource(
    tasks: Arc<dyn TaskRepository>,
    rate_limit: &str,
    page_size: usize,
) -> Result<Resource, ResourceError> {
    let config = ResourceConfig::builder("TaskResource")
        .allowed_methods(ALL)
        .predicate(permissions::login_required)
        .rate_limit(rate_limit, [CREATE, UPDATE, DELETE])
        .page_size(page_size)
        .build()?;
    let page_size = config.page_size();

    let filter = {
        let tasks = Arc::clone(&tasks);
        handler_fn(move |_, args| {
            let tasks = Arc::clone(&tasks);
            async move {
                let status = args.get("status").and_then(Value::as_str).map(str::to_string);
                let rows = tasks.list(status.as_deref(), page_size).await?;
                Ok(serde_json::to_value(rows)?)
            }
        })
    };

    let get_pk = {
        let tasks = Arc::clone(&tasks);
        handler_fn(move |_, args| {
            let tasks = Arc::clone(&tasks);
            async move {
                let pk = pk_from_args(&args)?;
                let task = tasks.find_by_id(pk).await?.ok_or(ResourceError::NotFound)?;
                Ok(serde_json::to_value(task)?)
            }
        })
    };

    let create = {
        let tasks = Arc::clone(&tasks);
        handler_fn(move |identity, args| {
            let tasks = Arc::clone(&tasks);
            async move {
                let new_task = clean_task(None, &args)?;
                let task = tasks.create(&new_task).await?;
                tracing::debug!(task = task.id, account = ?identity.account_id(), "Task created");
                Ok(serde_json::to_value(task)?)
            }
        })
    };

    let update = {
        let tasks = Arc::clone(&tasks);
        handler_fn(move |_, args| {
            let tasks = Arc::clone(&tasks);
            async move {
                let pk = pk_from_args(&args)?;
                let existing = tasks.find_by_id(pk).await?.ok_or(ResourceError::NotFound)?;
                let new_task = clean_task(Some(&existing), &args)?;
                let task = tasks
                    .update(pk, &new_task)
                    .await?
                    .ok_or(ResourceError::NotFound)?;
                Ok(serde_json::to_value(task)?)
            }
        })
    };

    let delete = {
        let tasks = Arc::clone(&tasks);
        handler_fn(move |_, args| {
            let tasks = Arc::clone(&tasks);
            async move {
                let pk = pk_from_args(&args)?;
                if !tasks.delete(pk).await? {
                    return Err(ResourceError::NotFound);
                }
                Ok(json!({ "pk": pk }))
            }
        })
    };

    Resource::builder(config)
        .handle(FILTER, filter)
        .handle(GET_PK, get_pk)
        .handle(CREATE, create)
        .handle(UPDATE, update)
        .handle(DELETE, delete)
        .build()
}

/// 自定义列表资源：读取公开，写操作要求登录，更新受限流
pub fn custom_list_resource(
    lists: Arc<dyn CustomListRepository>,
    rate_limit: &str,
) -> Result<Resource, ResourceError> {
    let config = ResourceConfig::builder("CustomListResource")
        .allowed_methods(ALL)
        .login_required_methods([CREATE, UPDATE, DELETE])
        .rate_limit(rate_limit, [UPDATE])
        .page_size(CUSTOM_LIST_PAGE_SIZE)
        .build()?;
    let page_size = config.page_size();

    let filter = {
        let lists = Arc::clone(&lists);
        handler_fn(move |_, _| {
            let lists = Arc::clone(&lists);
            async move {
                let rows = lists.list(page_size).await?;
                Ok(serde_json::to_value(rows)?)
            }
        })
    };

    let get_pk = {
        let lists = Arc::clone(&lists);
        handler_fn(move |_, args| {
            let lists = Arc::clone(&lists);
            async move {
                let pk = pk_from_args(&args)?;
                let list = lists.find_by_id(pk).await?.ok_or(ResourceError::NotFound)?;
                Ok(serde_json::to_value(list)?)
            }
        })
    };

    let create = {
        let lists = Arc::clone(&lists);
        handler_fn(move |_, args| {
            let lists = Arc::clone(&lists);
            async move {
                let new_list = clean_custom_list(None, &args)?;
                let list = lists.create(&new_list).await?.ok_or_else(|| {
                    ResourceError::invalid(
                        NON_FIELD_ERRORS,
                        "There can be only one CustomList instance",
                    )
                })?;
                Ok(serde_json::to_value(list)?)
            }
        })
    };

    let update = {
        let lists = Arc::clone(&lists);
        handler_fn(move |_, args| {
            let lists = Arc::clone(&lists);
            async move {
                let pk = pk_from_args(&args)?;
                let existing = lists.find_by_id(pk).await?.ok_or(ResourceError::NotFound)?;
                let new_list = clean_custom_list(Some(&existing), &args)?;
                let list = lists
                    .update(pk, &new_list)
                    .await?
                    .ok_or(ResourceError::NotFound)?;
                Ok(serde_json::to_value(list)?)
            }
        })
    };

    let delete = {
        let lists = Arc::clone(&lists);
        handler_fn(move |_, args| {
            let lists = Arc::clone(&lists);
            async move {
                let pk = pk_from_args(&args)?;
                if !lists.delete(pk).await? {
                    return Err(ResourceError::NotFound);
                }
                Ok(json!({ "pk": pk }))
            }
        })
    };

    Resource::builder(config)
        .handle(FILTER, filter)
        .handle(GET_PK, get_pk)
        .handle(CREATE, create)
        .handle(UPDATE, update)
        .handle(DELETE, delete)
        .build()
}

/// 注册全部业务资源
pub fn register_resources(
    registry: &mut ResourceRegistry,
    repositories: &Repositories,
    config: &Config,
) -> Result<(), ResourceError> {
    registry.register(
        "task",
        "tasks",
        task_resource(
            Arc::clone(&repositories.tasks),
            &config.task_rate_limit,
            TASK_PAGE_SIZE,
        )?,
        API_VERSION,
    )?;
    registry.register(
        "custom",
        "custom-list",
        custom_list_resource(
            Arc::clone(&repositories.custom_lists),
            &config.custom_list_rate_limit,
        )?,
        API_VERSION,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCounterStore;
    use crate::database::{MemoryTaskRepository, NewTask};
    use crate::resource::{Dispatcher, Identity};

    fn new_task(description: &str) -> NewTask {
        NewTask {
            title: String::new(),
            description: description.to_string(),
            status: "todo".to_string(),
            due_date: None,
        }
    }

    #[tokio::test]
    async fn filter_returns_at_most_page_size_rows() {
        let tasks = Arc::new(MemoryTaskRepository::new());
        for description in ["a", "b", "c"] {
            tasks.create(&new_task(description)).await.unwrap();
        }

        let resource = task_resource(tasks, "60/60", 2).unwrap();
        assert_eq!(resource.config().page_size(), 2);

        let dispatcher = Dispatcher::new(Arc::new(MemoryCounterStore::new()));
        let envelope = dispatcher
            .dispatch(&resource, &Identity::Account(1), FILTER, json!({}))
            .await;

        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.data.unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn zero_page_size_fails_registration() {
        let err = task_resource(Arc::new(MemoryTaskRepository::new()), "60/60", 0)
            .err()
            .unwrap();
        assert!(matches!(err, ResourceError::Config(_)));
    }
}
