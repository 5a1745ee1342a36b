/// Board membership endpoints
///
/// Members are managed by the board owner. Invites are by email and
/// idempotent; the owner's own membership row can never be changed or
/// removed. Every mutation responds with the refreshed roster so clients
/// can replace their member list wholesale.
///
/// # Endpoints
///
/// - `GET /v1/boards/:board_id/members` - List members
/// - `POST /v1/boards/:board_id/members` - Invite a registered user by email
/// - `PATCH /v1/boards/:board_id/members/:member_id` - Change a member's role
/// - `DELETE /v1/boards/:board_id/members/:member_id` - Remove a member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tackboard_shared::{
    auth::middleware::AuthContext,
    models::membership::{BoardRole, MemberWithUser},
};
use uuid::Uuid;
use validator::Validate;

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    /// Email of a registered user
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Role change request
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New role, `EDITOR` or `VIEWER`
    pub role: String,
}

/// Member roster response
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    /// All members of the board with their user identities
    pub members: Vec<MemberWithUser>,
}

fn parse_role(raw: &str) -> Result<BoardRole, ApiError> {
    match raw {
        "OWNER" => Ok(BoardRole::Owner),
        "EDITOR" => Ok(BoardRole::Editor),
        "VIEWER" => Ok(BoardRole::Viewer),
        other => Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "role".to_string(),
            message: format!("Unknown role {}", other),
        }])),
    }
}

/// List board members
///
/// Any member of the board may read the roster.
///
/// # Endpoint
///
/// ```text
/// GET /v1/boards/:board_id/members
/// Authorization: Bearer <access_token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "members": [
///     { "id": "uuid", "board_id": "uuid", "role": "OWNER", "user": { ... } }
///   ]
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller has no role on this board
/// - `404 Not Found`: Board does not exist
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<MembersResponse>> {
    let members = state.boards.list_members(auth.user_id, board_id).await?;

    Ok(Json(MembersResponse { members }))
}

/// Invite a registered user by email
///
/// Owner only. The invited user starts as `VIEWER`. Inviting someone who
/// is already on the board changes nothing and returns the current roster.
///
/// # Endpoint
///
/// ```text
/// POST /v1/boards/:board_id/members
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {
///   "email": "grace@example.com"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: Board does not exist, or no user has that email
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<MembersResponse>> {
    req.validate()?;

    state
        .boards
        .add_member(auth.user_id, board_id, &req.email)
        .await?;

    let members = state.boards.list_members(auth.user_id, board_id).await?;

    Ok(Json(MembersResponse { members }))
}

/// Change a member's role
///
/// Owner only. Only `EDITOR` and `VIEWER` can be assigned; the owner's own
/// row is immutable.
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/boards/:board_id/members/:member_id
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {
///   "role": "EDITOR"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown or non-assignable role
/// - `403 Forbidden`: Caller is not the owner, or the target is the owner's row
/// - `404 Not Found`: Board or membership does not exist
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((board_id, member_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<Json<MembersResponse>> {
    let role = parse_role(&req.role)?;

    state
        .boards
        .update_member_role(auth.user_id, board_id, member_id, role)
        .await?;

    let members = state.boards.list_members(auth.user_id, board_id).await?;

    Ok(Json(MembersResponse { members }))
}

/// Remove a member from the board
///
/// Owner only. The owner's own row cannot be removed.
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/boards/:board_id/members/:member_id
/// Authorization: Bearer <access_token>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the owner, or the target is the owner's row
/// - `404 Not Found`: Board or membership does not exist
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((board_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MembersResponse>> {
    state
        .boards
        .remove_member(auth.user_id, board_id, member_id)
        .await?;

    let members = state.boards.list_members(auth.user_id, board_id).await?;

    Ok(Json(MembersResponse { members }))
}
