use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 任务数据库实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TaskEntity {
    #[serde(rename = "pk")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
}

/// 通过校验的任务字段，用于创建和更新
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
}

impl TaskEntity {
    pub fn from_new(id: i64, task: &NewTask) -> Self {
        Self {
            id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.clone(),
            due_date: task.due_date,
        }
    }
}
