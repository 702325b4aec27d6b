//! Core types for the CogniTask engine.

use crate::error::{TaskError, ValidationReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum title length, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Maximum length of a caller-supplied task id.
pub const MAX_ID_LEN: usize = 128;

/// Task status. Any status may follow any other; the engine only restricts
/// values to this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Todo,
    #[serde(rename = "inprogress")]
    InProgress,
    Done,
    Blocked,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Todo, Status::InProgress, Status::Done, Status::Blocked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "inprogress",
            Status::Done => "done",
            Status::Blocked => "blocked",
        }
    }

    /// Statuses Focus Mode may pick from.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Status::Todo | Status::InProgress)
    }
}

impl FromStr for Status {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Status::Todo),
            "inprogress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            "blocked" => Ok(Status::Blocked),
            other => Err(TaskError::validation(
                ValidationReason::InvalidStatus,
                "status",
                format!(
                    "Invalid status '{}'. Valid statuses: todo, inprogress, done, blocked",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority, totally ordered `Urgent > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Urgent, Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Numeric rank; higher is more important. Mirrors the SQL `CASE` used by
    /// focus selection.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(TaskError::validation(
                ValidationReason::InvalidPriority,
                "priority",
                format!(
                    "Invalid priority '{}'. Valid priorities: urgent, high, medium, low",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task row. Timestamps are milliseconds since the Unix epoch (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<i64>,
    pub parent_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task together with the concurrency token derived from its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(flatten)]
    pub task: Task,
    pub etag: String,
}

/// A task with all of its descendants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTree {
    #[serde(flatten)]
    pub record: TaskRecord,
    pub children: Vec<TaskTree>,
}

/// Validated input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Caller-chosen id (UUID7 generated if not provided).
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<i64>,
    pub parent_id: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_due_date(mut self, due_date: i64) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update. Outer `None` leaves a field untouched; for clearable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<i64>>,
    pub parent_id: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.parent_id.is_none()
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn reparent(parent_id: Option<String>) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }
}

/// Parent filter for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentFilter {
    /// Tasks without a parent.
    Root,
    /// Direct children of the given task.
    Of(String),
}

/// Filters for `list_tasks`.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub parent: Option<ParentFilter>,
    pub limit: Option<u32>,
}

/// Aggregate statistics for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub todo: i64,
    pub inprogress: i64,
    pub done: i64,
    pub blocked: i64,
    /// Due in the past and still todo/inprogress.
    pub overdue: i64,
}
