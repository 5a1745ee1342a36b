/// In-memory storage engine
///
/// A mutex-guarded map-backed [`DataStore`] with the same observable
/// semantics as the Postgres engine. Each operation takes the lock once, so
/// multi-record writes are naturally atomic and concurrent duplicate invites
/// serialize into the insert-then-read-back shape.
///
/// Used by the test suites and usable for single-process deployments where
/// persistence is not required.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
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

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, Board>,
    memberships: HashMap<Uuid, Membership>,
    tasks: HashMap<Uuid, Task>,
    /// Push order doubles as chronological order, so newest-first reads are
    /// deterministic even under equal timestamps
    activities: Vec<Activity>,
}

/// Map-backed [`DataStore`]
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state();

        // Email uniqueness is case-insensitive, like CITEXT
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(StoreError::Conflict("users.email"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let state = self.state();
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn create_board_with_owner(
        &self,
        data: CreateBoard,
    ) -> StoreResult<(Board, Membership)> {
        let mut state = self.state();
        let now = Utc::now();

        let board = Board {
            id: Uuid::new_v4(),
            name: data.name,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        let membership = Membership {
            id: Uuid::new_v4(),
            board_id: board.id,
            user_id: data.owner_id,
            role: BoardRole::Owner,
            created_at: now,
            updated_at: now,
        };

        state.boards.insert(board.id, board.clone());
        state.memberships.insert(membership.id, membership.clone());

        Ok((board, membership))
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(self.state().boards.get(&id).cloned())
    }

    async fn list_boards_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<(Vec<Board>, Vec<Membership>)> {
        let state = self.state();

        let memberships: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();

        let member_board_ids: Vec<Uuid> = memberships.iter().map(|m| m.board_id).collect();

        let mut boards: Vec<Board> = state
            .boards
            .values()
            .filter(|b| b.owner_id == user_id || member_board_ids.contains(&b.id))
            .cloned()
            .collect();
        boards.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok((boards, memberships))
    }

    async fn update_board_name(&self, id: Uuid, name: &str) -> StoreResult<Option<Board>> {
        let mut state = self.state();
        match state.boards.get_mut(&id) {
            Some(board) => {
                board.name = name.to_string();
                board.updated_at = Utc::now();
                Ok(Some(board.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_board(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state();

        if state.boards.remove(&id).is_none() {
            return Ok(false);
        }
        state.memberships.retain(|_, m| m.board_id != id);
        state.tasks.retain(|_, t| t.board_id != id);
        state.activities.retain(|a| a.board_id != id);

        Ok(true)
    }

    async fn find_membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .state()
            .memberships
            .values()
            .find(|m| m.board_id == board_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_membership_by_id(
        &self,
        board_id: Uuid,
        membership_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .state()
            .memberships
            .get(&membership_id)
            .filter(|m| m.board_id == board_id)
            .cloned())
    }

    async fn list_memberships(&self, board_id: Uuid) -> StoreResult<Vec<Membership>> {
        let mut members: Vec<Membership> = self
            .state()
            .memberships
            .values()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(members)
    }

    async fn insert_membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> StoreResult<(Membership, bool)> {
        let mut state = self.state();

        // The lock plays the part of the unique constraint: a duplicate
        // insert returns the existing row unchanged
        if let Some(existing) = state
            .memberships
            .values()
            .find(|m| m.board_id == board_id && m.user_id == user_id)
        {
            return Ok((existing.clone(), false));
        }

        let now = Utc::now();
        let membership = Membership {
            id: Uuid::new_v4(),
            board_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        };
        state.memberships.insert(membership.id, membership.clone());

        Ok((membership, true))
    }

    async fn update_membership_role(
        &self,
        membership_id: Uuid,
        role: BoardRole,
    ) -> StoreResult<Option<Membership>> {
        let mut state = self.state();
        match state.memberships.get_mut(&membership_id) {
            Some(membership) => {
                membership.role = role;
                membership.updated_at = Utc::now();
                Ok(Some(membership.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_membership(&self, membership_id: Uuid) -> StoreResult<bool> {
        Ok(self.state().memberships.remove(&membership_id).is_some())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, data: NewTask) -> StoreResult<Task> {
        let mut state = self.state();
        let now = Utc::now();

        let task = Task {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            due_date: data.due_date,
            labels: data.labels,
            assigned_to: data.assigned_to,
            order: data.order,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state().tasks.get(&id).cloned())
    }

    async fn list_tasks(
        &self,
        board_id: Uuid,
        labels: Option<&[String]>,
    ) -> StoreResult<Vec<Task>> {
        let state = self.state();

        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.board_id == board_id)
            .filter(|t| match labels {
                Some(wanted) => t.labels.iter().any(|l| wanted.contains(l)),
                None => true,
            })
            .cloned()
            .collect();

        tasks.sort_by(|a, b| {
            (a.status.lane_index(), a.order, a.created_at)
                .cmp(&(b.status.lane_index(), b.order, b.created_at))
        });

        Ok(tasks)
    }

    async fn max_order_in_lane(
        &self,
        board_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Option<i64>> {
        Ok(self
            .state()
            .tasks
            .values()
            .filter(|t| t.board_id == board_id && t.status == status)
            .map(|t| t.order)
            .max())
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        let mut state = self.state();

        let task = match state.tasks.get_mut(&id) {
            Some(task) => task,
            None => return Ok(None),
        };

        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = &patch.due_date {
            task.due_date = *due_date;
        }
        if let Some(labels) = &patch.labels {
            task.labels = labels.clone();
        }
        if let Some(assigned_to) = &patch.assigned_to {
            task.assigned_to = *assigned_to;
        }
        if let Some(order) = patch.order {
            task.order = order;
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state().tasks.remove(&id).is_some())
    }

    async fn apply_positions(
        &self,
        board_id: Uuid,
        updates: &[TaskPosition],
    ) -> StoreResult<u64> {
        let mut state = self.state();
        let mut moved = 0u64;

        for update in updates {
            // Ids outside this board are skipped, never cross-applied
            if let Some(task) = state
                .tasks
                .get_mut(&update.task_id)
                .filter(|t| t.board_id == board_id)
            {
                task.status = update.status;
                task.order = update.order;
                task.updated_at = Utc::now();
                moved += 1;
            }
        }

        Ok(moved)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn append_activity(
        &self,
        board_id: Uuid,
        actor_id: Uuid,
        event: &ActivityEvent,
    ) -> StoreResult<Activity> {
        let activity = Activity {
            id: Uuid::new_v4(),
            board_id,
            actor_id,
            kind: event.kind().to_string(),
            meta: event.meta(),
            created_at: Utc::now(),
        };
        self.state().activities.push(activity.clone());

        Ok(activity)
    }

    async fn list_activities(&self, board_id: Uuid, limit: i64) -> StoreResult<Vec<Activity>> {
        Ok(self
            .state()
            .activities
            .iter()
            .rev()
            .filter(|a| a.board_id == board_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
