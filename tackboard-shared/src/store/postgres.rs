/// Postgres storage engine
///
/// Implements the store traits over a sqlx connection pool. Multi-record
/// invariants map onto Postgres features: the board + owner membership pair
/// is one transaction, the cascade delete rides the FK graph
/// (`ON DELETE CASCADE`), the idempotent invite is
/// `ON CONFLICT DO NOTHING` + read-back, and bulk position writes run in a
/// single transaction scoped to the board.
///
/// Membership rows come out of the database as raw TEXT tokens and are
/// normalized here, at materialization, so legacy `MEMBER` rows surface as
/// `EDITOR` without a migration rewrite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::activity::{Activity, ActivityEvent};
use crate::models::board::{Board, CreateBoard};
use crate::models::membership::{BoardRole, Membership};
use crate::models::task::{Task, TaskPatch, TaskPosition, TaskStatus};
use crate::models::user::{CreateUser, User};
use crate::store::{
    ActivityStore, BoardStore, DataStore, IdentityStore, NewTask, StoreError, StoreResult,
    TaskStore,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const BOARD_COLUMNS: &str = "id, name, owner_id, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, board_id, user_id, role, created_at, updated_at";
const TASK_COLUMNS: &str = "id, board_id, title, description, status, priority, due_date, \
                            labels, assigned_to, sort_order, created_by, created_at, updated_at";
const ACTIVITY_COLUMNS: &str = "id, board_id, actor_id, kind, meta, created_at";

/// Postgres-backed [`DataStore`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Membership row as stored, before role normalization
#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    /// The storage/domain boundary: raw tokens never get past this call
    fn into_membership(self) -> Membership {
        Membership {
            id: self.id,
            board_id: self.board_id,
            user_id: self.user_id,
            role: BoardRole::normalize(&self.role),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err))
                if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Err(StoreError::Conflict("users.email"))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait]
impl BoardStore for PgStore {
    async fn create_board_with_owner(
        &self,
        data: CreateBoard,
    ) -> StoreResult<(Board, Membership)> {
        let mut tx = self.pool.begin().await?;

        let board = sqlx::query_as::<_, Board>(&format!(
            "INSERT INTO boards (name, owner_id) VALUES ($1, $2) RETURNING {BOARD_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "INSERT INTO board_members (board_id, user_id, role) VALUES ($1, $2, $3) \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(board.id)
        .bind(board.owner_id)
        .bind(BoardRole::Owner.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((board, row.into_membership()))
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        let board = sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(board)
    }

    async fn list_boards_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<(Vec<Board>, Vec<Membership>)> {
        let boards = sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards \
             WHERE owner_id = $1 \
                OR id IN (SELECT board_id FROM board_members WHERE user_id = $1) \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, MembershipRow>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM board_members WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let memberships = rows.into_iter().map(MembershipRow::into_membership).collect();

        Ok((boards, memberships))
    }

    async fn update_board_name(&self, id: Uuid, name: &str) -> StoreResult<Option<Board>> {
        let board = sqlx::query_as::<_, Board>(&format!(
            "UPDATE boards SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(board)
    }

    async fn delete_board(&self, id: Uuid) -> StoreResult<bool> {
        // Memberships, tasks, and activities ride the FK cascade
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM board_members WHERE board_id = $1 AND user_id = $2"
        ))
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MembershipRow::into_membership))
    }

    async fn find_membership_by_id(
        &self,
        board_id: Uuid,
        membership_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM board_members WHERE id = $1 AND board_id = $2"
        ))
        .bind(membership_id)
        .bind(board_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MembershipRow::into_membership))
    }

    async fn list_memberships(&self, board_id: Uuid) -> StoreResult<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM board_members WHERE board_id = $1 ORDER BY created_at ASC"
        ))
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MembershipRow::into_membership).collect())
    }

    async fn insert_membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> StoreResult<(Membership, bool)> {
        let inserted = sqlx::query_as::<_, MembershipRow>(&format!(
            "INSERT INTO board_members (board_id, user_id, role) VALUES ($1, $2, $3) \
             ON CONFLICT (board_id, user_id) DO NOTHING \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(board_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((row.into_membership(), true));
        }

        // Lost the race or the row already existed: read it back unchanged
        let existing = sqlx::query_as::<_, MembershipRow>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM board_members WHERE board_id = $1 AND user_id = $2"
        ))
        .bind(board_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((existing.into_membership(), false))
    }

    async fn update_membership_role(
        &self,
        membership_id: Uuid,
        role: BoardRole,
    ) -> StoreResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "UPDATE board_members SET role = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(membership_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MembershipRow::into_membership))
    }

    async fn delete_membership(&self, membership_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM board_members WHERE id = $1")
            .bind(membership_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, data: NewTask) -> StoreResult<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (board_id, title, description, status, priority, due_date, \
                                labels, assigned_to, sort_order, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(data.board_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .bind(data.due_date)
        .bind(data.labels)
        .bind(data.assigned_to)
        .bind(data.order)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn list_tasks(
        &self,
        board_id: Uuid,
        labels: Option<&[String]>,
    ) -> StoreResult<Vec<Task>> {
        // Lane order is TODO < DOING < DONE, not the tokens' alphabetical order
        let lane_sort = "CASE status WHEN 'TODO' THEN 0 WHEN 'DOING' THEN 1 ELSE 2 END, \
                         sort_order ASC, created_at ASC";

        let tasks = if let Some(labels) = labels {
            sqlx::query_as::<_, Task>(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks \
                 WHERE board_id = $1 AND labels && $2 \
                 ORDER BY {lane_sort}"
            ))
            .bind(board_id)
            .bind(labels.to_vec())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Task>(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE board_id = $1 ORDER BY {lane_sort}"
            ))
            .bind(board_id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(tasks)
    }

    async fn max_order_in_lane(
        &self,
        board_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Option<i64>> {
        let (max,): (Option<i64>,) = sqlx::query_as(
            "SELECT MAX(sort_order) FROM tasks WHERE board_id = $1 AND status = $2",
        )
        .bind(board_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        // Build the UPDATE from the fields present in the patch
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if patch.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if patch.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if patch.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${bind_count}"));
        }
        if patch.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${bind_count}"));
        }
        if patch.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${bind_count}"));
        }
        if patch.labels.is_some() {
            bind_count += 1;
            query.push_str(&format!(", labels = ${bind_count}"));
        }
        if patch.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${bind_count}"));
        }
        if patch.order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sort_order = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = &patch.title {
            q = q.bind(title.clone());
        }
        if let Some(description) = &patch.description {
            q = q.bind(description.clone());
        }
        if let Some(status) = patch.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = patch.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(due_date) = &patch.due_date {
            q = q.bind(*due_date);
        }
        if let Some(labels) = &patch.labels {
            q = q.bind(labels.clone());
        }
        if let Some(assigned_to) = &patch.assigned_to {
            q = q.bind(*assigned_to);
        }
        if let Some(order) = patch.order {
            q = q.bind(order);
        }

        let task = q.fetch_optional(&self.pool).await?;

        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_positions(
        &self,
        board_id: Uuid,
        updates: &[TaskPosition],
    ) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut moved = 0u64;

        for update in updates {
            // The board_id predicate makes foreign or unknown ids a no-op
            let result = sqlx::query(
                "UPDATE tasks SET status = $3, sort_order = $4, updated_at = NOW() \
                 WHERE id = $1 AND board_id = $2",
            )
            .bind(update.task_id)
            .bind(board_id)
            .bind(update.status.as_str())
            .bind(update.order)
            .execute(&mut *tx)
            .await?;

            moved += result.rows_affected();
        }

        tx.commit().await?;

        Ok(moved)
    }
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn append_activity(
        &self,
        board_id: Uuid,
        actor_id: Uuid,
        event: &ActivityEvent,
    ) -> StoreResult<Activity> {
        let activity = sqlx::query_as::<_, Activity>(&format!(
            "INSERT INTO activities (board_id, actor_id, kind, meta) VALUES ($1, $2, $3, $4) \
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(board_id)
        .bind(actor_id)
        .bind(event.kind())
        .bind(event.meta())
        .fetch_one(&self.pool)
        .await?;

        Ok(activity)
    }

    async fn list_activities(&self, board_id: Uuid, limit: i64) -> StoreResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE board_id = $1 \
             ORDER BY created_at DESC, seq DESC LIMIT $2"
        ))
        .bind(board_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
