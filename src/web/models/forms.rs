//! Submitted form bodies and their conversion into service inputs.
//!
//! Every field is a plain string with a default so a half-filled form still
//! deserializes; the checks happen in `into_input` and in the services.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;

use crate::db::models::TaskWithTags;
use crate::db::services::TaskInput;
use crate::validation::{ValidationErrors, normalize_task_content};

/// Format used by `<input type="datetime-local">`.
pub const DEADLINE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    pub content: String,
    pub deadline: String,
    /// Checkbox: present (any value) when ticked.
    pub is_done: Option<String>,
    pub tags: Vec<String>,
}

impl TaskForm {
    /// Pre-fills the edit form from a stored task.
    pub fn from_task(task: &TaskWithTags) -> Self {
        Self {
            content: task.content.clone(),
            deadline: task
                .deadline
                .map(|d| d.format(DEADLINE_INPUT_FORMAT).to_string())
                .unwrap_or_default(),
            is_done: task.is_done.then(|| "on".to_string()),
            tags: task.tags.iter().map(|t| t.id.to_string()).collect(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.is_done.is_some()
    }

    /// Tag ids that parse; used to keep checkboxes ticked on redisplay.
    pub fn selected_tag_ids(&self) -> Vec<i32> {
        self.tags
            .iter()
            .filter_map(|raw| raw.trim().parse().ok())
            .collect()
    }

    /// Values for re-rendering the form.
    pub fn context_value(&self) -> serde_json::Value {
        json!({
            "content": self.content,
            "deadline": self.deadline,
            "is_done": self.is_done(),
            "tags": self.selected_tag_ids(),
        })
    }

    pub fn into_input(self) -> Result<TaskInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let content = normalize_task_content(&self.content).unwrap_or_else(|e| {
            errors.merge(e);
            String::new()
        });

        let deadline = parse_deadline(&self.deadline).unwrap_or_else(|e| {
            errors.merge(e);
            None
        });

        let mut tag_ids = BTreeSet::new();
        for raw in self.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            match raw.parse::<i32>() {
                Ok(id) => {
                    tag_ids.insert(id);
                }
                Err(_) => errors.add("tags", format!("\u{201c}{raw}\u{201d} is not a valid value.")),
            }
        }

        let is_done = self.is_done();
        errors.into_result(TaskInput {
            content,
            deadline,
            is_done,
            tag_ids,
        })
    }
}

/// Empty means no deadline. Values without an offset are taken as UTC.
pub fn parse_deadline(raw: &str) -> Result<Option<DateTime<Utc>>, ValidationErrors> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(naive.and_utc()));
    }

    Err(ValidationErrors::single(
        "deadline",
        "Enter a valid date/time.",
    ))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagForm {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths made of visible ASCII are followed after
/// login. Browsers strip tabs and newlines, so `/\t/host` would become `//host`.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    let visible = next.chars().all(|c| c.is_ascii_graphic());
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    (visible && local).then(|| next.to_string())
}
