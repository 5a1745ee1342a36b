/// Activity model: the append-only per-board event log
///
/// Every meaningful mutation appends exactly one record. Records are never
/// updated or individually deleted; they disappear only when their board is
/// deleted. Reads are newest-first.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activities (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     seq BIGSERIAL,
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     actor_id UUID NOT NULL REFERENCES users(id),
///     kind TEXT NOT NULL,
///     meta JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `seq` only breaks `created_at` ties in newest-first reads; it is not part
/// of the record's wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::models::task::TaskStatus;

/// Activity record as stored and served
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    /// Unique activity ID (UUID v4)
    pub id: Uuid,

    /// Board the activity belongs to
    pub board_id: Uuid,

    /// User who performed the action
    pub actor_id: Uuid,

    /// Event kind token, one of the [`ActivityEvent`] kinds
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific payload
    pub meta: JsonValue,

    /// When the activity was recorded
    pub created_at: DateTime<Utc>,
}

/// The events that can be recorded, with their typed payloads
///
/// Services construct one of these per mutation; the storage engines turn it
/// into the stored `kind` + `meta` pair via [`ActivityEvent::kind`] and
/// [`ActivityEvent::meta`]. Meta is never assembled as loose JSON at call
/// sites.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    /// A board was created
    BoardCreated,

    /// A user was invited onto the board
    MemberAdded { member_user_id: Uuid },

    /// A task was created
    TaskCreated { task_id: Uuid, title: String },

    /// Task fields changed without a lane change
    TaskUpdated {
        task_id: Uuid,
        fields: Vec<String>,
    },

    /// A task changed status lanes
    TaskMoved {
        task_id: Uuid,
        from_status: TaskStatus,
        to_status: TaskStatus,
    },

    /// A task was deleted
    TaskDeleted { task_id: Uuid },
}

impl ActivityEvent {
    /// The stored kind token for this event
    pub fn kind(&self) -> &'static str {
        match self {
            ActivityEvent::BoardCreated => "BOARD_CREATED",
            ActivityEvent::MemberAdded { .. } => "MEMBER_ADDED",
            ActivityEvent::TaskCreated { .. } => "TASK_CREATED",
            ActivityEvent::TaskUpdated { .. } => "TASK_UPDATED",
            ActivityEvent::TaskMoved { .. } => "TASK_MOVED",
            ActivityEvent::TaskDeleted { .. } => "TASK_DELETED",
        }
    }

    /// The stored meta payload for this event
    pub fn meta(&self) -> JsonValue {
        match self {
            ActivityEvent::BoardCreated => json!({}),
            ActivityEvent::MemberAdded { member_user_id } => json!({
                "member_user_id": member_user_id,
            }),
            ActivityEvent::TaskCreated { task_id, title } => json!({
                "task_id": task_id,
                "title": title,
            }),
            ActivityEvent::TaskUpdated { task_id, fields } => json!({
                "task_id": task_id,
                "fields": fields,
            }),
            ActivityEvent::TaskMoved {
                task_id,
                from_status,
                to_status,
            } => json!({
                "task_id": task_id,
                "from_status": from_status.as_str(),
                "to_status": to_status.as_str(),
            }),
            ActivityEvent::TaskDeleted { task_id } => json!({
                "task_id": task_id,
            }),
        }
    }
}

/// Default number of records returned by activity reads
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 20;
