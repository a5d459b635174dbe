use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 自定义列表实体，全局最多一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CustomListEntity {
    #[serde(rename = "pk")]
    pub id: i64,
    pub custom_list: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomList {
    pub custom_list: Option<String>,
}
