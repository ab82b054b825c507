//! Data access for tasks, tags and users.
//!
//! Task operations are always scoped to an owner; tag operations are global.

pub mod tag_service;
pub mod task_service;
pub mod user_service;

pub use tag_service::{TagError, TagService};
pub use task_service::{RECENT_TASKS_PAGE_SIZE, TaskError, TaskInput, TaskService};
