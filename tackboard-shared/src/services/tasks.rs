/// Task service
///
/// Task CRUD and bulk reordering. Any board member may create, update,
/// delete, and reorder tasks; the one elevated rule is assignment, where
/// changing `assigned_to` requires `OWNER` or `EDITOR` and the assignee
/// must be a member of the board.
///
/// Placement within a lane uses a sparse integer order: a new task lands at
/// the current lane maximum plus 1000 (1000 for an empty lane) unless an
/// explicit order is supplied, leaving gaps for drag-and-drop inserts
/// without renumbering.
///
/// Every mutation records exactly one activity event. A status change
/// records `TASK_MOVED` with the lane transition; any other update records
/// `TASK_UPDATED` naming the patched fields. Bulk reorders record nothing.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::authorization::{require_access, resolve_role, AuthzError};
use crate::models::activity::ActivityEvent;
use crate::models::board::Board;
use crate::models::membership::BoardRole;
use crate::models::task::{CreateTask, Task, TaskPatch, TaskPosition, TaskPriority, TaskStatus};
use crate::store::{DataStore, NewTask, StoreError};

use super::record_activity;

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task does not exist
    #[error("Task {0} not found")]
    NotFound(Uuid),

    /// The requested assignee has no role on the board
    #[error("Assignee {0} is not a member of this board")]
    AssigneeNotMember(Uuid),

    /// The actor's role does not permit assignment changes
    #[error("Only owners and editors may change task assignment")]
    AssignmentForbidden,

    /// Authorization failure
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Task operations over a [`DataStore`]
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn DataStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Creates a task on the board
    ///
    /// Requires any role on the board. `status` defaults to `TODO` and
    /// `priority` to `MEDIUM`. When no explicit `order` is supplied the
    /// task is placed after the last task in its lane. Records
    /// `TASK_CREATED`.
    ///
    /// # Errors
    ///
    /// Assignment at creation follows the assignment rule:
    /// `TaskError::AssignmentForbidden` for viewers,
    /// `TaskError::AssigneeNotMember` for non-member assignees.
    pub async fn create_task(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        data: CreateTask,
    ) -> Result<Task, TaskError> {
        let (board, role) = require_access(self.store.as_ref(), actor_id, board_id).await?;

        if data.assigned_to.is_some() {
            self.check_assignment(&board, role, data.assigned_to).await?;
        }

        let status = data.status.unwrap_or(TaskStatus::Todo);
        let priority = data.priority.unwrap_or(TaskPriority::Medium);

        let order = match data.order {
            Some(order) => order,
            None => self
                .store
                .max_order_in_lane(board_id, status)
                .await?
                .map(|max| max + 1000)
                .unwrap_or(1000),
        };

        let task = self
            .store
            .insert_task(NewTask {
                board_id,
                title: data.title,
                description: data.description,
                status,
                priority,
                due_date: data.due_date,
                labels: data.labels.unwrap_or_default(),
                assigned_to: data.assigned_to,
                order,
                created_by: actor_id,
            })
            .await?;

        tracing::info!(task_id = %task.id, board_id = %board_id, "Task created");
        record_activity(
            self.store.as_ref(),
            board_id,
            actor_id,
            ActivityEvent::TaskCreated {
                task_id: task.id,
                title: task.title.clone(),
            },
        )
        .await;

        Ok(task)
    }

    /// Lists the board's tasks in display order
    ///
    /// Sorted by lane (`TODO` < `DOING` < `DONE`), then order, then
    /// creation time. An optional label filter keeps tasks carrying at
    /// least one of the given labels.
    pub async fn list_tasks(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        labels: Option<Vec<String>>,
    ) -> Result<Vec<Task>, TaskError> {
        require_access(self.store.as_ref(), actor_id, board_id).await?;

        Ok(self.store.list_tasks(board_id, labels.as_deref()).await?)
    }

    /// Applies a sparse patch to a task
    ///
    /// Only the fields present in the patch change; everything else is left
    /// untouched. Exactly one activity event is recorded per call: a lane
    /// change records `TASK_MOVED { from_status, to_status }`, anything
    /// else records `TASK_UPDATED { fields }`, never both.
    ///
    /// # Errors
    ///
    /// - `TaskError::NotFound` if the task does not exist
    /// - `TaskError::AssignmentForbidden` if a viewer touches `assigned_to`
    /// - `TaskError::AssigneeNotMember` if the new assignee is an outsider
    pub async fn update_task(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, TaskError> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(TaskError::NotFound(task_id))?;

        let (board, role) = require_access(self.store.as_ref(), actor_id, task.board_id).await?;

        // Outer Some means the field is being changed, including to null
        if let Some(change) = &patch.assigned_to {
            self.check_assignment(&board, role, *change).await?;
        }

        let previous_status = task.status;
        let updated = self
            .store
            .update_task(task_id, &patch)
            .await?
            .ok_or(TaskError::NotFound(task_id))?;

        let event = if patch.status.is_some() && updated.status != previous_status {
            ActivityEvent::TaskMoved {
                task_id,
                from_status: previous_status,
                to_status: updated.status,
            }
        } else {
            ActivityEvent::TaskUpdated {
                task_id,
                fields: patch.changed_fields().iter().map(|f| f.to_string()).collect(),
            }
        };

        tracing::info!(task_id = %task_id, board_id = %updated.board_id, "Task updated");
        record_activity(self.store.as_ref(), updated.board_id, actor_id, event).await;

        Ok(updated)
    }

    /// Deletes a task. Records `TASK_DELETED`
    pub async fn delete_task(&self, actor_id: Uuid, task_id: Uuid) -> Result<(), TaskError> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(TaskError::NotFound(task_id))?;

        require_access(self.store.as_ref(), actor_id, task.board_id).await?;

        if !self.store.delete_task(task_id).await? {
            return Err(TaskError::NotFound(task_id));
        }

        tracing::info!(task_id = %task_id, board_id = %task.board_id, "Task deleted");
        record_activity(
            self.store.as_ref(),
            task.board_id,
            actor_id,
            ActivityEvent::TaskDeleted { task_id },
        )
        .await;

        Ok(())
    }

    /// Applies a batch of position updates in one atomic write
    ///
    /// Each update sets a task's status and order. Ids that do not belong
    /// to the board are skipped without error, so a stale client cannot
    /// move another board's tasks. Returns the number of tasks moved.
    /// Records no activity.
    pub async fn reorder_tasks(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        updates: &[TaskPosition],
    ) -> Result<u64, TaskError> {
        require_access(self.store.as_ref(), actor_id, board_id).await?;

        let moved = self.store.apply_positions(board_id, updates).await?;

        tracing::info!(board_id = %board_id, moved, "Tasks reordered");
        Ok(moved)
    }

    /// Enforces the assignment rule: actor must be owner or editor, and a
    /// non-null assignee must resolve a role on the board
    async fn check_assignment(
        &self,
        board: &Board,
        actor_role: BoardRole,
        assignee: Option<Uuid>,
    ) -> Result<(), TaskError> {
        if !actor_role.can_assign() {
            return Err(TaskError::AssignmentForbidden);
        }

        if let Some(assignee) = assignee {
            match resolve_role(self.store.as_ref(), board, assignee).await {
                Ok(_) => {}
                Err(AuthzError::NotMember(_)) => {
                    return Err(TaskError::AssigneeNotMember(assignee))
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}
