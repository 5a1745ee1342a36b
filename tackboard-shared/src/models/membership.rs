/// Board membership model and the role model
///
/// Every access to a board is mediated by a role resolved from these rows
/// (or from board ownership). Stored role tokens include a legacy value,
/// `MEMBER`, which older deployments wrote for invited collaborators; it is
/// normalized to `EDITOR` the moment a row is materialized, so domain code
/// only ever sees the canonical three roles.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE board_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role TEXT NOT NULL DEFAULT 'VIEWER'
///         CHECK (role IN ('OWNER', 'EDITOR', 'VIEWER', 'MEMBER')),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (board_id, user_id)
/// );
/// ```
///
/// The column stays TEXT rather than a Postgres enum so legacy rows remain
/// representable and normalization stays a real conversion point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserSummary;

/// Canonical board roles
///
/// Gating decisions are set-membership checks over these values; there is no
/// numeric ordering between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardRole {
    /// Board owner: full control, exactly one per board
    Owner,

    /// Can create and modify tasks and assignments
    Editor,

    /// Read-only access to the board, its tasks, and its activity
    Viewer,
}

impl BoardRole {
    /// Converts the role to its stored string token
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardRole::Owner => "OWNER",
            BoardRole::Editor => "EDITOR",
            BoardRole::Viewer => "VIEWER",
        }
    }

    /// Normalizes a stored role token to a canonical role
    ///
    /// Total over all inputs:
    ///
    /// - canonical tokens map to themselves
    /// - the legacy `MEMBER` token maps to [`BoardRole::Editor`]
    /// - anything else (unknown token, empty string) maps to
    ///   [`BoardRole::Viewer`]
    ///
    /// This is the single conversion point between stored tokens and the
    /// domain; code past the storage engines never sees a raw token.
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "OWNER" => BoardRole::Owner,
            "EDITOR" => BoardRole::Editor,
            "VIEWER" => BoardRole::Viewer,
            "MEMBER" => BoardRole::Editor,
            _ => BoardRole::Viewer,
        }
    }

    /// Returns true if this role is in the allowed set
    pub fn is_allowed(&self, allowed: &[BoardRole]) -> bool {
        allowed.contains(self)
    }

    /// Returns true if this role may change task assignments
    pub fn can_assign(&self) -> bool {
        matches!(self, BoardRole::Owner | BoardRole::Editor)
    }
}

impl std::fmt::Display for BoardRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership model linking a user to a board with a role
///
/// Unique on `(board_id, user_id)`. The role is always canonical here;
/// storage engines normalize raw tokens on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Unique membership ID (UUID v4)
    pub id: Uuid,

    /// Board this membership belongs to
    pub board_id: Uuid,

    /// Member user ID
    pub user_id: Uuid,

    /// Canonical role on the board
    pub role: BoardRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,

    /// When the membership was last updated
    pub updated_at: DateTime<Utc>,
}

/// Member-list row: a membership joined with its user's safe summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberWithUser {
    /// Membership ID
    pub id: Uuid,

    /// Board ID
    pub board_id: Uuid,

    /// Canonical role on the board
    pub role: BoardRole,

    /// The member's user summary
    pub user: UserSummary,
}
