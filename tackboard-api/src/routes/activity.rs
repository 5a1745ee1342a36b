/// Board activity feed endpoint
///
/// The activity log is append-only; this endpoint reads it newest-first.
/// Feed entries are written by the board and task mutations themselves.
///
/// # Endpoints
///
/// - `GET /v1/boards/:board_id/activity?limit=N` - Read the feed

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tackboard_shared::{auth::middleware::AuthContext, models::activity::Activity};
use uuid::Uuid;

/// Feed query parameters
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// Maximum number of records to return (default 20)
    pub limit: Option<i64>,
}

/// Feed response
#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    /// Activity records, newest first
    pub activities: Vec<Activity>,
}

/// Read the board's activity feed
///
/// Any member of the board may read the feed. Records come back newest
/// first; `limit` caps the page size and falls back to 20 when absent or
/// not a positive number.
///
/// # Endpoint
///
/// ```text
/// GET /v1/boards/:board_id/activity?limit=50
/// Authorization: Bearer <access_token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "activities": [
///     {
///       "id": "uuid",
///       "board_id": "uuid",
///       "actor_id": "uuid",
///       "type": "TASK_MOVED",
///       "meta": { "task_id": "uuid", "from_status": "TODO", "to_status": "DOING" },
///       "created_at": "2026-07-01T12:00:00Z"
///     }
///   ]
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller has no role on this board
/// - `404 Not Found`: Board does not exist
pub async fn list_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<ActivitiesResponse>> {
    let activities = state
        .boards
        .list_activity(auth.user_id, board_id, query.limit)
        .await?;

    Ok(Json(ActivitiesResponse { activities }))
}
