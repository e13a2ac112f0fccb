pub mod content_type;
pub mod file;
pub mod task;
pub mod task_config;
