// 数据库模块
// 包含数据库实体定义和存储库操作

pub mod models; // 数据库实体定义
pub mod repositories; // 存储库实现

use std::sync::Arc;

use sqlx::PgPool;

// 重新导出常用类型，方便其他模块使用
pub use models::custom_list::{CustomListEntity, NewCustomList};
pub use models::task::{NewTask, TaskEntity};
pub use models::user::UserEntity;
pub use repositories::custom_list::{
    CustomListRepository, MemoryCustomListRepository, PgCustomListRepository,
};
pub use repositories::task::{MemoryTaskRepository, PgTaskRepository, TaskRepository};
pub use repositories::user::{MemoryUserRepository, PgUserRepository, UserRepository};

/// 应用使用的全部存储库
#[derive(Clone)]
pub struct Repositories {
    pub tasks: Arc<dyn TaskRepository>,
    pub custom_lists: Arc<dyn CustomListRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            custom_lists: Arc::new(PgCustomListRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }

    /// 进程内存储，未配置数据库时使用
    pub fn memory() -> Self {
        Self {
            tasks: Arc::new(MemoryTaskRepository::new()),
            custom_lists: Arc::new(MemoryCustomListRepository::new()),
            users: Arc::new(MemoryUserRepository::new()),
        }
    }
}
