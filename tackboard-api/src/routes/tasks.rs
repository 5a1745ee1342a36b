/// Task endpoints
///
/// Tasks live under a board and move between the `TODO`, `DOING`, and
/// `DONE` lanes. Creation and listing are addressed through the board;
/// updates and deletes are addressed by task id alone, with the board
/// resolved from the task itself. Bulk reorder applies a batch of lane
/// positions in one shot after a drag.
///
/// # Endpoints
///
/// - `GET /v1/boards/:board_id/tasks?labels=a,b` - List tasks in lane order
/// - `POST /v1/boards/:board_id/tasks` - Create a task
/// - `PATCH /v1/boards/:board_id/tasks/reorder` - Apply a batch of positions
/// - `PATCH /v1/tasks/:task_id` - Patch a task
/// - `DELETE /v1/tasks/:task_id` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::OkResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tackboard_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, TaskPatch, TaskPosition, TaskPriority, TaskStatus},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Initial lane (default `TODO`)
    pub status: Option<TaskStatus>,

    /// Initial priority (default `MEDIUM`)
    pub priority: Option<TaskPriority>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Initial label set (default empty)
    pub labels: Option<Vec<String>>,

    /// Optional assignee, must be a board member
    pub assigned_to: Option<Uuid>,

    /// Explicit lane position (default: appended past the lane's end)
    pub order: Option<i64>,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Comma-separated labels; tasks matching any of them are returned
    pub labels: Option<String>,
}

/// Bulk reorder request
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Target positions, applied in order
    pub updates: Vec<TaskPosition>,
}

/// Single task response
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// The task
    pub task: Task,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct TasksResponse {
    /// Tasks in lane order (`TODO`, `DOING`, `DONE`), then by position
    pub tasks: Vec<Task>,
}

/// Splits a comma-separated query value into labels
///
/// Whitespace around entries is dropped, as are empty entries. An absent
/// parameter or one that parses to nothing means no filter.
fn parse_labels(raw: Option<&str>) -> Option<Vec<String>> {
    let labels: Vec<String> = raw?
        .split(',')
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect();

    if labels.is_empty() {
        None
    } else {
        Some(labels)
    }
}

/// Create a task under a board
///
/// Any member may create tasks. Missing fields fall back to defaults:
/// `TODO`, `MEDIUM`, empty labels, and a position appended past the end of
/// the target lane. Setting an assignee requires an `OWNER` or `EDITOR`
/// role and the assignee must be a member of the board.
///
/// # Endpoint
///
/// ```text
/// POST /v1/boards/:board_id/tasks
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {
///   "title": "Ship the release",
///   "priority": "HIGH",
///   "labels": ["release"]
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "task": { "id": "uuid", "title": "Ship the release", "status": "TODO", "order": 1000, ... }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Caller has no role on this board, or may not assign
/// - `404 Not Found`: Board does not exist
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let task = state
        .tasks
        .create_task(
            auth.user_id,
            board_id,
            CreateTask {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                due_date: req.due_date,
                labels: req.labels,
                assigned_to: req.assigned_to,
                order: req.order,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

/// List a board's tasks
///
/// Tasks come back sorted by lane (`TODO`, `DOING`, `DONE`) and then by
/// position within the lane. The optional `labels` parameter is a
/// comma-separated list; tasks carrying any of the given labels match.
///
/// # Endpoint
///
/// ```text
/// GET /v1/boards/:board_id/tasks?labels=release,urgent
/// Authorization: Bearer <access_token>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller has no role on this board
/// - `404 Not Found`: Board does not exist
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<TasksResponse>> {
    let labels = parse_labels(query.labels.as_deref());

    let tasks = state.tasks.list_tasks(auth.user_id, board_id, labels).await?;

    Ok(Json(TasksResponse { tasks }))
}

/// Patch a task
///
/// Only fields present in the body are applied; `null` clears the nullable
/// fields (`description`, `due_date`, `assigned_to`). A status change is
/// recorded in the activity feed as a move, any other change as an update.
/// Touching `assigned_to` in either direction requires an `OWNER` or
/// `EDITOR` role.
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/tasks/:task_id
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {
///   "status": "DOING",
///   "order": 1500
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty patch or invalid title
/// - `403 Forbidden`: Caller has no role on the task's board, or may not assign
/// - `404 Not Found`: Task does not exist
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<TaskResponse>> {
    if patch.is_empty() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "body".to_string(),
            message: "At least one field must be provided".to_string(),
        }]));
    }

    if let Some(title) = &patch.title {
        if title.is_empty() || title.chars().count() > 200 {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "title".to_string(),
                message: "Title must be between 1 and 200 characters".to_string(),
            }]));
        }
    }

    let task = state.tasks.update_task(auth.user_id, task_id, patch).await?;

    Ok(Json(TaskResponse { task }))
}

/// Delete a task
///
/// Any member of the task's board may delete it.
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/tasks/:task_id
/// Authorization: Bearer <access_token>
/// ```
///
/// # Response
///
/// ```json
/// { "ok": true }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller has no role on the task's board
/// - `404 Not Found`: Task does not exist
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state.tasks.delete_task(auth.user_id, task_id).await?;

    Ok(Json(OkResponse::new()))
}

/// Apply a batch of lane positions
///
/// Used after a drag to persist where every affected task landed. Entries
/// naming tasks that do not belong to the board are skipped; the rest are
/// applied. The batch records nothing in the activity feed.
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/boards/:board_id/tasks/reorder
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {
///   "updates": [
///     { "task_id": "uuid", "status": "DOING", "order": 1000 },
///     { "task_id": "uuid", "status": "DOING", "order": 2000 }
///   ]
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "ok": true }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty batch
/// - `403 Forbidden`: Caller has no role on this board
/// - `404 Not Found`: Board does not exist
pub async fn reorder_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<OkResponse>> {
    if req.updates.is_empty() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "updates".to_string(),
            message: "At least one update must be provided".to_string(),
        }]));
    }

    state
        .tasks
        .reorder_tasks(auth.user_id, board_id, &req.updates)
        .await?;

    Ok(Json(OkResponse::new()))
}
