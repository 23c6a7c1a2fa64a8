use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::security::escape_html;

/// Placeholder shown in place of a missing due date.
pub const NO_DUE_DATE: &str = "No due date";

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
///
/// Transitions are unconstrained: any status may be set through an update,
/// and `Completed` is not terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    /// Initial state of every new task.
    #[default]
    Pending,
    /// Task is currently being worked on.
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    /// Task is done.
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for creating a task.
///
/// Missing text fields deserialize as empty strings so the service can answer
/// with its own "required" message. Non-emptiness is checked by the service;
/// the derive only enforces length limits.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. At most 200 characters.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: String,

    /// The description of the task. At most 1000 characters.
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,

    /// Optional due date, `YYYY-MM-DD`. An empty string means no due date.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub due_date: Option<NaiveDate>,
}

impl TaskInput {
    pub fn has_required_fields(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }

    /// Escapes markup in the free-text fields before storage or echo.
    pub fn sanitized(self) -> Self {
        Self {
            title: escape_html(self.title.trim()),
            description: escape_html(self.description.trim()),
            due_date: self.due_date,
        }
    }
}

/// Payload for updating a task's details.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskUpdateInput {
    pub task_id: Option<Uuid>,

    #[serde(flatten)]
    #[validate]
    pub fields: TaskInput,

    /// When present, the status is overwritten as well.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Payload for the operations that only need a task id.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskIdInput {
    pub task_id: Option<Uuid>,
}

/// The set of columns an update writes.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChanges {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

/// Represents a task entity as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// Identifier of the user who owns the task.
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    /// Timestamp of when the task was created. Never updated.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` owned by `user_id` in the `Pending` state.
    /// `input` is expected to be sanitized already.
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// A task as returned by the list endpoint, with dates formatted for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub status: TaskStatus,
    pub created_at: String,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            due_date: task
                .due_date
                .map(display_date)
                .unwrap_or_else(|| NO_DUE_DATE.to_string()),
            status: task.status,
            created_at: display_date(task.created_at.date_naive()),
        }
    }
}

/// Formats a date like `Jan 5, 2025`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid due_date {:?}, expected YYYY-MM-DD", value))),
    }
}
