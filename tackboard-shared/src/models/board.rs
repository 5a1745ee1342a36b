/// Board model
///
/// A board is the unit of collaboration: it has one owner, a set of member
/// rows (see `membership`), a set of tasks, and an activity feed. Deleting a
/// board cascades to all three.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Board model representing a kanban board
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    /// Unique board ID (UUID v4)
    pub id: Uuid,

    /// Board name (non-empty)
    pub name: String,

    /// User who owns the board
    ///
    /// The owner always resolves to the OWNER role, even if their membership
    /// row were missing
    pub owner_id: Uuid,

    /// When the board was created
    pub created_at: DateTime<Utc>,

    /// When the board was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new board
#[derive(Debug, Clone)]
pub struct CreateBoard {
    /// Board name
    pub name: String,

    /// Owner user ID
    pub owner_id: Uuid,
}
