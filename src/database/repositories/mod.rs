pub mod custom_list;
pub mod task;
pub mod user;
