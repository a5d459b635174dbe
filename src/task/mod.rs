// 任务与自定义列表资源

pub mod form;
pub mod resources;

pub use resources::{custom_list_resource, register_resources, task_resource};
