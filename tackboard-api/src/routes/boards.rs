/// Board lifecycle endpoints
///
/// Boards are the unit of collaboration: every task, membership, and
/// activity record hangs off one. Creation seeds an owner membership and
/// the activity trail; deletion cascades over all of it.
///
/// # Endpoints
///
/// - `POST /v1/boards` - Create a board
/// - `GET /v1/boards` - List boards the caller belongs to
/// - `GET /v1/boards/:board_id` - Fetch one board with members
/// - `PATCH /v1/boards/:board_id` - Rename a board (owner only)
/// - `DELETE /v1/boards/:board_id` - Delete a board (owner only)

use crate::{
    app::AppState,
    error::ApiResult,
    routes::OkResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tackboard_shared::{
    auth::middleware::AuthContext,
    models::board::Board,
    services::{BoardDetail, BoardWithRole},
};
use uuid::Uuid;
use validator::Validate;

/// Create board request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    /// Board name
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
}

/// Rename board request
#[derive(Debug, Deserialize, Validate)]
pub struct RenameBoardRequest {
    /// New board name
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
}

/// Single board response
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    /// The board
    pub board: Board,
}

/// Board list response
#[derive(Debug, Serialize)]
pub struct BoardsResponse {
    /// Boards the caller belongs to, annotated with owner and role
    pub boards: Vec<BoardWithRole>,
}

/// Create a board
///
/// The caller becomes the board's owner and gets an `OWNER` membership row.
///
/// # Endpoint
///
/// ```text
/// POST /v1/boards
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {
///   "name": "Sprint 12"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "board": { "id": "uuid", "name": "Sprint 12", "owner_id": "uuid", ... }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Missing or invalid token
pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<BoardResponse>)> {
    req.validate()?;

    let board = state.boards.create_board(auth.user_id, req.name).await?;

    Ok((StatusCode::CREATED, Json(BoardResponse { board })))
}

/// List boards the caller belongs to
///
/// Covers boards the caller owns and boards they were invited to. Each
/// entry carries the owner's identity and the caller's own role.
///
/// # Endpoint
///
/// ```text
/// GET /v1/boards
/// Authorization: Bearer <access_token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "boards": [
///     { "id": "uuid", "name": "Sprint 12", "owner": { ... }, "my_role": "OWNER", ... }
///   ]
/// }
/// ```
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BoardsResponse>> {
    let boards = state.boards.list_boards(auth.user_id).await?;

    Ok(Json(BoardsResponse { boards }))
}

/// Fetch one board with its member roster
///
/// # Endpoint
///
/// ```text
/// GET /v1/boards/:board_id
/// Authorization: Bearer <access_token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "board": { ... },
///   "owner": { "id": "uuid", "name": "Ada", "email": "ada@example.com" },
///   "members": [ { "id": "uuid", "role": "OWNER", "user": { ... } } ],
///   "my_role": "EDITOR"
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller has no role on this board
/// - `404 Not Found`: Board does not exist
pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<BoardDetail>> {
    let detail = state.boards.get_board(auth.user_id, board_id).await?;

    Ok(Json(detail))
}

/// Rename a board
///
/// Owner only.
///
/// # Endpoint
///
/// ```text
/// PATCH /v1/boards/:board_id
/// Authorization: Bearer <access_token>
/// Content-Type: application/json
///
/// {
///   "name": "Sprint 13"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: Board does not exist
pub async fn rename_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<RenameBoardRequest>,
) -> ApiResult<Json<BoardResponse>> {
    req.validate()?;

    let board = state
        .boards
        .rename_board(auth.user_id, board_id, &req.name)
        .await?;

    Ok(Json(BoardResponse { board }))
}

/// Delete a board
///
/// Owner only. Removes the board along with its memberships, tasks, and
/// activity records.
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/boards/:board_id
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
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: Board does not exist
pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state.boards.delete_board(auth.user_id, board_id).await?;

    Ok(Json(OkResponse::new()))
}
