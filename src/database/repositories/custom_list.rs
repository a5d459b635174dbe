use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::database::models::custom_list::{CustomListEntity, NewCustomList};

/// 自定义列表存储库
#[async_trait]
pub trait CustomListRepository: Send + Sync {
    async fn list(&self, limit: usize) -> Result<Vec<CustomListEntity>, sqlx::Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CustomListEntity>, sqlx::Error>;

    /// 已存在一条记录时返回 `None`
    async fn create(&self, list: &NewCustomList) -> Result<Option<CustomListEntity>, sqlx::Error>;

    async fn update(
        &self,
        id: i64,
        list: &NewCustomList,
    ) -> Result<Option<CustomListEntity>, sqlx::Error>;

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error>;
}

/// PostgreSQL 自定义列表存储库，唯一性由 `custom_lists_singleton` 索引保证
pub struct PgCustomListRepository {
    pool: PgPool,
}

impl PgCustomListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomListRepository for PgCustomListRepository {
    async fn list(&self, limit: usize) -> Result<Vec<CustomListEntity>, sqlx::Error> {
        sqlx::query_as::<_, CustomListEntity>(
            "SELECT id, custom_list FROM custom_lists ORDER BY id LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CustomListEntity>, sqlx::Error> {
        sqlx::query_as::<_, CustomListEntity>(
            "SELECT id, custom_list FROM custom_lists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create(&self, list: &NewCustomList) -> Result<Option<CustomListEntity>, sqlx::Error> {
        let result = sqlx::query_as::<_, CustomListEntity>(
            r#"
            INSERT INTO custom_lists (custom_list)
            VALUES ($1)
            RETURNING id, custom_list
            "#,
        )
        .bind(&list.custom_list)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(Some(created)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::debug!("Custom list already exists");
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Failed to create custom list: {:?}", e);
                Err(e)
            }
        }
    }

    async fn update(
        &self,
        id: i64,
        list: &NewCustomList,
    ) -> Result<Option<CustomListEntity>, sqlx::Error> {
        sqlx::query_as::<_, CustomListEntity>(
            r#"
            UPDATE custom_lists
            SET custom_list = $1
            WHERE id = $2
            RETURNING id, custom_list
            "#,
        )
        .bind(&list.custom_list)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM custom_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// 进程内自定义列表存储库
#[derive(Default)]
pub struct MemoryCustomListRepository {
    inner: Mutex<MemoryCustomList>,
}

#[derive(Default)]
struct MemoryCustomList {
    next_id: i64,
    row: Option<CustomListEntity>,
}

impl MemoryCustomListRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomListRepository for MemoryCustomListRepository {
    async fn list(&self, limit: usize) -> Result<Vec<CustomListEntity>, sqlx::Error> {
        let inner = self.inner.lock();
        Ok(inner.row.iter().take(limit).cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CustomListEntity>, sqlx::Error> {
        let inner = self.inner.lock();
        Ok(inner.row.as_ref().filter(|row| row.id == id).cloned())
    }

    async fn create(&self, list: &NewCustomList) -> Result<Option<CustomListEntity>, sqlx::Error> {
        let mut inner = self.inner.lock();
        if inner.row.is_some() {
            return Ok(None);
        }

        inner.next_id += 1;
        let created = CustomListEntity {
            id: inner.next_id,
            custom_list: list.custom_list.clone(),
        };
        inner.row = Some(created.clone());
        Ok(Some(created))
    }

    async fn update(
        &self,
        id: i64,
        list: &NewCustomList,
    ) -> Result<Option<CustomListEntity>, sqlx::Error> {
        let mut inner = self.inner.lock();
        Ok(inner.row.as_mut().filter(|row| row.id == id).map(|row| {
            row.custom_list = list.custom_list.clone();
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock();
        if inner.row.as_ref().is_some_and(|row| row.id == id) {
            inner.row = None;
            return Ok(true);
        }
        Ok(false)
    }
}
