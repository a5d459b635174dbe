use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::database::models::user::UserEntity;

/// 用户存储库
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 用户名已存在时返回 `None`
    async fn create(&self, username: &str, password_hash: &str)
    -> Result<Option<UserEntity>, sqlx::Error>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error>;
}

/// PostgreSQL 用户存储库
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => {
                tracing::info!("Created user: {}", user.id);
                Ok(Some(user))
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => {
                tracing::error!("Failed to create user: {:?}", e);
                Err(e)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }
}

/// 进程内用户存储库
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: Mutex<MemoryUsers>,
}

#[derive(Default)]
struct MemoryUsers {
    next_id: i64,
    by_username: HashMap<String, UserEntity>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let mut inner = self.inner.lock();
        if inner.by_username.contains_key(username) {
            return Ok(None);
        }

        inner.next_id += 1;
        let user = UserEntity {
            id: inner.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.by_username.insert(username.to_string(), user.clone());
        Ok(Some(user))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        Ok(self.inner.lock().by_username.get(username).cloned())
    }
}
