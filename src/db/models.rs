use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::entities::{tag, task};

/// A task together with the tags attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskWithTags {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_done: bool,
    pub tags: Vec<tag::Model>,
}

impl TaskWithTags {
    pub fn from_parts(task: task::Model, mut tags: Vec<tag::Model>) -> Self {
        tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Self {
            id: task.id,
            user_id: task.user_id,
            content: task.content,
            created_at: task.created_at,
            deadline: task.deadline,
            is_done: task.is_done,
            tags,
        }
    }

    pub fn tag_ids(&self) -> Vec<i32> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// One page of the unscoped "recent tasks" listing. Pages are 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<TaskWithTags>,
    pub page: u64,
    pub num_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}
