/// Task model
///
/// Tasks live on a board in one of three status lanes. Position inside a lane
/// is a sparse integer (`order`, multiples of 1000 by default) so a task can
/// be dropped between two neighbors without rewriting the whole lane.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title VARCHAR(500) NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'TODO'
///         CHECK (status IN ('TODO', 'DOING', 'DONE')),
///     priority TEXT NOT NULL DEFAULT 'MEDIUM'
///         CHECK (priority IN ('LOW', 'MEDIUM', 'HIGH')),
///     due_date TIMESTAMPTZ,
///     labels TEXT[] NOT NULL DEFAULT '{}',
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     sort_order BIGINT NOT NULL DEFAULT 0,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Task status lanes
///
/// Lanes sort `TODO < DOING < DONE` in listings, regardless of the tokens'
/// alphabetical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// In progress
    Doing,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Converts the status to its stored string token
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::Doing => "DOING",
            TaskStatus::Done => "DONE",
        }
    }

    /// Parses a status from its stored string token
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(TaskStatus::Todo),
            "DOING" => Some(TaskStatus::Doing),
            "DONE" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Position of this lane in board listings
    pub fn lane_index(&self) -> u8 {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::Doing => 1,
            TaskStatus::Done => 2,
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("unknown task status: {value}"))
    }
}

/// Task priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Converts the priority to its stored string token
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }

    /// Parses a priority from its stored string token
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(TaskPriority::Low),
            "MEDIUM" => Some(TaskPriority::Medium),
            "HIGH" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("unknown task priority: {value}"))
    }
}

/// Task model representing a card on a board
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Board this task belongs to
    pub board_id: Uuid,

    /// Task title (non-empty)
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Status lane
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    /// Priority level
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Free-form labels
    pub labels: Vec<String>,

    /// Assigned user, if any
    ///
    /// When set, must reference a member of the board
    pub assigned_to: Option<Uuid>,

    /// Position within the status lane (sparse, ascending)
    #[sqlx(rename = "sort_order")]
    pub order: i64,

    /// User who created the task
    pub created_by: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Missing status/priority/labels fall back to their defaults; a missing
/// `order` is derived as 1000 past the end of the target lane.
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub labels: Option<Vec<String>>,
    pub assigned_to: Option<Uuid>,
    pub order: Option<i64>,
}

/// Sparse patch for updating a task
///
/// Only fields present in the JSON body are applied. For the nullable fields
/// (`description`, `due_date`, `assigned_to`) an explicit `null` clears the
/// value, while an absent field leaves it untouched; the outer `Option` is
/// presence, the inner one the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    /// New title
    pub title: Option<String>,

    /// New description (`null` clears)
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// New status lane
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date (`null` clears)
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// Replacement label set
    pub labels: Option<Vec<String>>,

    /// New assignee (`null` unassigns)
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    /// New position within the lane
    pub order: Option<i64>,
}

/// Deserializes a present-but-possibly-null field into `Some(inner)`
///
/// Serde collapses `Option<Option<T>>` on `null` to the outer `None`, which
/// would make "clear this field" indistinguishable from "leave it alone".
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// Returns true if no field is present in the patch
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.labels.is_none()
            && self.assigned_to.is_none()
            && self.order.is_none()
    }

    /// Names of the fields present in the patch, in schema order
    ///
    /// This is the `fields` list recorded in `TASK_UPDATED` activity meta.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.due_date.is_some() {
            fields.push("due_date");
        }
        if self.labels.is_some() {
            fields.push("labels");
        }
        if self.assigned_to.is_some() {
            fields.push("assigned_to");
        }
        if self.order.is_some() {
            fields.push("order");
        }
        fields
    }
}

/// One entry of a bulk reorder: where a task should sit after a drag
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskPosition {
    /// Task to move
    pub task_id: Uuid,

    /// Target status lane
    pub status: TaskStatus,

    /// Target position within the lane
    pub order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tokens_round_trip() {
        for status in [TaskStatus::Todo, TaskStatus::Doing, TaskStatus::Done] {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("BLOCKED"), None);
    }

    #[test]
    fn test_lane_order_is_todo_doing_done() {
        assert!(TaskStatus::Todo.lane_index() < TaskStatus::Doing.lane_index());
        assert!(TaskStatus::Doing.lane_index() < TaskStatus::Done.lane_index());
    }

    #[test]
    fn test_priority_tokens_round_trip() {
        for priority in [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High] {
            assert_eq!(TaskPriority::from_str(priority.as_str()), Some(priority));
        }
        assert_eq!(TaskPriority::from_str("URGENT"), None);
    }

    #[test]
    fn test_patch_absent_vs_null_vs_value() {
        // Absent fields stay None at the outer level
        let patch: TaskPatch = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(patch.title.as_deref(), Some("New"));
        assert!(patch.description.is_none());
        assert!(patch.assigned_to.is_none());

        // Explicit null arrives as Some(None): clear the field
        let patch: TaskPatch =
            serde_json::from_str(r#"{"assigned_to": null, "due_date": null}"#).unwrap();
        assert_eq!(patch.assigned_to, Some(None));
        assert_eq!(patch.due_date, Some(None));

        // A value arrives as Some(Some(value))
        let id = Uuid::new_v4();
        let patch: TaskPatch =
            serde_json::from_str(&format!(r#"{{"assigned_to": "{id}"}}"#)).unwrap();
        assert_eq!(patch.assigned_to, Some(Some(id)));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());

        let patch: TaskPatch = serde_json::from_str(r#"{}"#).unwrap();
        assert!(patch.is_empty());

        let patch: TaskPatch = serde_json::from_str(r#"{"order": 500}"#).unwrap();
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_changed_fields_in_schema_order() {
        let patch: TaskPatch = serde_json::from_str(
            r#"{"status": "DOING", "title": "T", "labels": ["a"], "description": null}"#,
        )
        .unwrap();

        assert_eq!(
            patch.changed_fields(),
            vec!["title", "description", "status", "labels"]
        );
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Doing).unwrap(),
            "\"DOING\""
        );
        let status: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
    }
}
