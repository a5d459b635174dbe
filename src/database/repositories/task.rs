use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::database::models::task::{NewTask, TaskEntity};

/// 任务存储库
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 按 ID 升序列出任务，可按状态过滤
    async fn list(&self, status: Option<&str>, limit: usize) -> Result<Vec<TaskEntity>, sqlx::Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<TaskEntity>, sqlx::Error>;

    async fn create(&self, task: &NewTask) -> Result<TaskEntity, sqlx::Error>;

    async fn update(&self, id: i64, task: &NewTask) -> Result<Option<TaskEntity>, sqlx::Error>;

    /// 返回是否删除了记录
    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error>;
}

/// PostgreSQL 任务存储库
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list(&self, status: Option<&str>, limit: usize) -> Result<Vec<TaskEntity>, sqlx::Error> {
        sqlx::query_as::<_, TaskEntity>(
            r#"
            SELECT id, title, description, status, due_date
            FROM tasks
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(status)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TaskEntity>, sqlx::Error> {
        sqlx::query_as::<_, TaskEntity>(
            r#"
            SELECT id, title, description, status, due_date
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create(&self, task: &NewTask) -> Result<TaskEntity, sqlx::Error> {
        let created = sqlx::query_as::<_, TaskEntity>(
            r#"
            INSERT INTO tasks (title, description, status, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, status, due_date
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created task: {}", created.id);
        Ok(created)
    }

    async fn update(&self, id: i64, task: &NewTask) -> Result<Option<TaskEntity>, sqlx::Error> {
        sqlx::query_as::<_, TaskEntity>(
            r#"
            UPDATE tasks
            SET title = $1, description = $2, status = $3, due_date = $4
            WHERE id = $5
            RETURNING id, title, description, status, due_date
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.due_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// 进程内任务存储库
#[derive(Default)]
pub struct MemoryTaskRepository {
    inner: Mutex<MemoryTasks>,
}

#[derive(Default)]
struct MemoryTasks {
    next_id: i64,
    rows: BTreeMap<i64, TaskEntity>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn list(&self, status: Option<&str>, limit: usize) -> Result<Vec<TaskEntity>, sqlx::Error> {
        let inner = self.inner.lock();
        Ok(inner
            .rows
            .values()
            .filter(|task| status.is_none_or(|status| task.status == status))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TaskEntity>, sqlx::Error> {
        Ok(self.inner.lock().rows.get(&id).cloned())
    }

    async fn create(&self, task: &NewTask) -> Result<TaskEntity, sqlx::Error> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let created = TaskEntity::from_new(inner.next_id, task);
        inner.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, task: &NewTask) -> Result<Option<TaskEntity>, sqlx::Error> {
        let mut inner = self.inner.lock();
        Ok(inner.rows.get_mut(&id).map(|row| {
            *row = TaskEntity::from_new(id, task);
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        Ok(self.inner.lock().rows.remove(&id).is_some())
    }
}
