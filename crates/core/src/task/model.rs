//! Task model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title shown when a row carries neither `title` nor the legacy `task` column
pub const UNTITLED: &str = "Untitled";

/// Server-assigned task identifier; newer tasks have larger ids
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A task owned by the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: String,
    pub title: String,
    /// Description; empty when the task has none
    pub text: String,
    pub is_complete: bool,
    pub inserted_at: Option<DateTime<Utc>>,
}

/// A row as returned by the backend.
///
/// Older tables stored the title in a `task` column and may lack `text`,
/// so everything except `id` is optional here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: TaskId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_complete: Option<bool>,
    #[serde(default)]
    pub inserted_at: Option<DateTime<Utc>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let title = non_empty(row.title)
            .or_else(|| non_empty(row.task))
            .unwrap_or_else(|| UNTITLED.to_string());

        Self {
            id: row.id,
            user_id: row.user_id.unwrap_or_default(),
            title,
            text: row.text.unwrap_or_default(),
            is_complete: row.is_complete.unwrap_or(false),
            inserted_at: row.inserted_at,
        }
    }
}

/// Insert payload; the backend assigns `id`, `is_complete` and `inserted_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub text: String,
    pub user_id: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, text: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            user_id: user_id.into(),
        }
    }
}

/// Targeted update; absent fields are left untouched by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

impl TaskPatch {
    /// Patch that only sets the completion flag
    pub fn completion(is_complete: bool) -> Self {
        Self {
            is_complete: Some(is_complete),
            ..Self::default()
        }
    }

    /// Patch that rewrites title and description
    pub fn content(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: Some(text.into()),
            is_complete: None,
        }
    }

    /// Apply this patch to a local copy of the task
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(text) = &self.text {
            task.text = text.clone();
        }
        if let Some(is_complete) = self.is_complete {
            task.is_complete = is_complete;
        }
    }
}
