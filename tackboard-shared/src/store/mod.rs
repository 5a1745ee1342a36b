/// Storage layer for Tackboard
///
/// This module defines the storage contract the services run against, plus
/// two engines implementing it:
///
/// - `postgres`: the production engine (sqlx over Postgres)
/// - `memory`: a mutex-guarded in-process engine used by the test suites and
///   single-process deployments
///
/// The contract is split along the system's stores: identities, boards and
/// memberships, tasks, and the activity log. [`DataStore`] unifies them so a
/// single handle can be passed around.
///
/// Multi-record invariants are the engine's responsibility: the board and its
/// owner membership appear atomically, board deletion cascades, duplicate
/// invites converge to one row, and a bulk reorder applies as a unit.
/// Engines also normalize raw role tokens when membership rows are
/// materialized, so callers only ever see canonical roles.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::activity::{Activity, ActivityEvent};
use crate::models::board::{Board, CreateBoard};
use crate::models::membership::{BoardRole, Membership};
use crate::models::task::{Task, TaskPatch, TaskPosition, TaskPriority, TaskStatus};
use crate::models::user::{CreateUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violated
    #[error("Unique constraint violated on {0}")]
    Conflict(&'static str),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Fully-resolved task insert
///
/// Defaults and the derived lane position are applied by the task service
/// before this reaches an engine.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub board_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub assigned_to: Option<Uuid>,
    pub order: i64,
    pub created_by: Uuid,
}

/// User accounts: creation and lookup
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Creates a user
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the email is already taken.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Finds a user by ID
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Finds a user by email (case-insensitive)
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Finds all users whose IDs are in `ids`
    ///
    /// Missing IDs are skipped; the result order is unspecified.
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
}

/// Boards and their membership rows
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Creates a board together with its owner's `OWNER` membership row
    ///
    /// The two inserts are atomic: no observer ever sees a board without its
    /// owner membership.
    async fn create_board_with_owner(&self, data: CreateBoard)
        -> StoreResult<(Board, Membership)>;

    /// Finds a board by ID
    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>>;

    /// Lists boards the user owns or is a member of, newest-created-first,
    /// along with the user's own membership rows
    ///
    /// The membership rows let the caller derive the user's role per board
    /// without a second query per board.
    async fn list_boards_for_user(&self, user_id: Uuid) -> StoreResult<(Vec<Board>, Vec<Membership>)>;

    /// Renames a board; returns None if it no longer exists
    async fn update_board_name(&self, id: Uuid, name: &str) -> StoreResult<Option<Board>>;

    /// Deletes a board and cascades to its memberships, tasks, and
    /// activity records
    ///
    /// Returns false if the board did not exist.
    async fn delete_board(&self, id: Uuid) -> StoreResult<bool>;

    /// Finds the membership row for `(board_id, user_id)`
    async fn find_membership(&self, board_id: Uuid, user_id: Uuid)
        -> StoreResult<Option<Membership>>;

    /// Finds a membership row by its own ID, scoped to a board
    async fn find_membership_by_id(
        &self,
        board_id: Uuid,
        membership_id: Uuid,
    ) -> StoreResult<Option<Membership>>;

    /// Lists all membership rows of a board, oldest-first
    async fn list_memberships(&self, board_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Inserts a membership row, idempotently
    ///
    /// Under the `(board_id, user_id)` unique constraint a duplicate insert
    /// returns the existing row unchanged. The boolean is true only when a
    /// new row was actually created. Two concurrent inserts for the same
    /// pair converge to one row.
    async fn insert_membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> StoreResult<(Membership, bool)>;

    /// Changes a membership row's role; returns None if the row is gone
    async fn update_membership_role(
        &self,
        membership_id: Uuid,
        role: BoardRole,
    ) -> StoreResult<Option<Membership>>;

    /// Deletes a membership row; returns false if it did not exist
    async fn delete_membership(&self, membership_id: Uuid) -> StoreResult<bool>;
}

/// Tasks within boards
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a task
    async fn insert_task(&self, data: NewTask) -> StoreResult<Task>;

    /// Finds a task by ID
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Lists a board's tasks sorted by lane (`TODO < DOING < DONE`), then
    /// `order` ascending, then `created_at` ascending
    ///
    /// With `labels`, only tasks carrying at least one of the given labels
    /// are returned.
    async fn list_tasks(&self, board_id: Uuid, labels: Option<&[String]>)
        -> StoreResult<Vec<Task>>;

    /// Highest `order` value in a board's status lane, if the lane has tasks
    async fn max_order_in_lane(&self, board_id: Uuid, status: TaskStatus)
        -> StoreResult<Option<i64>>;

    /// Applies a sparse patch to a task; returns None if it no longer exists
    ///
    /// Only fields present in the patch are written; `Some(None)` clears a
    /// nullable column.
    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> StoreResult<Option<Task>>;

    /// Deletes a task; returns false if it did not exist
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Applies a batch of lane/position writes atomically
    ///
    /// Every write is scoped to `board_id`: an ID belonging to another board
    /// (or to nothing) is skipped without effect. Returns the number of rows
    /// actually moved.
    async fn apply_positions(&self, board_id: Uuid, updates: &[TaskPosition]) -> StoreResult<u64>;
}

/// The append-only activity log
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Appends one activity record
    async fn append_activity(
        &self,
        board_id: Uuid,
        actor_id: Uuid,
        event: &ActivityEvent,
    ) -> StoreResult<Activity>;

    /// Reads a board's activity, newest-first, up to `limit` records
    async fn list_activities(&self, board_id: Uuid, limit: i64) -> StoreResult<Vec<Activity>>;
}

/// The complete storage contract
///
/// Services and the API state hold an `Arc<dyn DataStore>`; engines implement
/// all four store traits plus a liveness probe.
#[async_trait]
pub trait DataStore: IdentityStore + BoardStore + TaskStore + ActivityStore {
    /// Cheap liveness check for health reporting
    async fn ping(&self) -> StoreResult<()>;
}
