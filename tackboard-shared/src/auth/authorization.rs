/// Board-level authorization
///
/// Every board operation runs through the checks in this module before
/// touching data. The permission model is role-based per board:
///
/// 1. **Existence**: the board must exist ([`AuthzError::BoardNotFound`])
/// 2. **Membership**: the actor must resolve a role on the board
///    ([`AuthzError::NotMember`])
/// 3. **Role set**: the resolved role must be in the operation's allowed
///    set ([`AuthzError::InsufficientRole`])
///
/// The ordering is deliberate: a caller learns "board does not exist"
/// before "you are not a member", so probing a nonexistent board id gives
/// the same 404 a member would get, while an outsider probing an existing
/// board gets 403.
///
/// Checks are set-membership, not a hierarchy comparison. Each operation
/// declares the roles it accepts, e.g. `&[BoardRole::Owner]` for renames
/// or `&[BoardRole::Owner, BoardRole::Editor]` for assignment changes.
///
/// # Example
///
/// ```no_run
/// use tackboard_shared::auth::authorization::require_role;
/// use tackboard_shared::models::membership::BoardRole;
/// use tackboard_shared::store::BoardStore;
/// use uuid::Uuid;
///
/// async fn rename_check<S: BoardStore + ?Sized>(
///     store: &S,
///     actor_id: Uuid,
///     board_id: Uuid,
/// ) -> Result<(), Box<dyn std::error::Error>> {
///     require_role(store, actor_id, board_id, &[BoardRole::Owner]).await?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use crate::models::board::Board;
use crate::models::membership::BoardRole;
use crate::store::{BoardStore, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The board does not exist
    #[error("Board {0} not found")]
    BoardNotFound(Uuid),

    /// The actor has no role on the board
    #[error("Not a member of board {0}")]
    NotMember(Uuid),

    /// The actor's role is not in the operation's allowed set
    #[error("Insufficient permissions: requires one of {required:?}, has {actual}")]
    InsufficientRole {
        required: Vec<BoardRole>,
        actual: BoardRole,
    },

    /// Storage error during the check
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Resolves the actor's effective role on an already-fetched board
///
/// The board owner is `OWNER` without a membership lookup. Everyone else
/// resolves through their membership row, whose role was normalized when
/// the row was materialized.
///
/// # Errors
///
/// Returns `AuthzError::NotMember` if the actor is neither the owner nor
/// a member.
pub async fn resolve_role<S>(
    store: &S,
    board: &Board,
    actor_id: Uuid,
) -> Result<BoardRole, AuthzError>
where
    S: BoardStore + ?Sized,
{
    if board.owner_id == actor_id {
        return Ok(BoardRole::Owner);
    }

    match store.find_membership(board.id, actor_id).await? {
        Some(membership) => Ok(membership.role),
        None => Err(AuthzError::NotMember(board.id)),
    }
}

/// Checks that the board exists and the actor has any role on it
///
/// Returns the board together with the actor's role, so callers do not
/// refetch the record they just authorized against.
///
/// # Errors
///
/// - `AuthzError::BoardNotFound` if the board record is absent, checked
///   before membership
/// - `AuthzError::NotMember` if the actor resolves no role
pub async fn require_access<S>(
    store: &S,
    actor_id: Uuid,
    board_id: Uuid,
) -> Result<(Board, BoardRole), AuthzError>
where
    S: BoardStore + ?Sized,
{
    let board = store
        .find_board(board_id)
        .await?
        .ok_or(AuthzError::BoardNotFound(board_id))?;

    let role = resolve_role(store, &board, actor_id).await?;

    Ok((board, role))
}

/// Checks access and that the actor's role is in the allowed set
///
/// # Errors
///
/// Everything [`require_access`] returns, plus
/// `AuthzError::InsufficientRole` when the resolved role is outside
/// `allowed`.
pub async fn require_role<S>(
    store: &S,
    actor_id: Uuid,
    board_id: Uuid,
    allowed: &[BoardRole],
) -> Result<(Board, BoardRole), AuthzError>
where
    S: BoardStore + ?Sized,
{
    let (board, role) = require_access(store, actor_id, board_id).await?;

    if !role.is_allowed(allowed) {
        return Err(AuthzError::InsufficientRole {
            required: allowed.to_vec(),
            actual: role,
        });
    }

    Ok((board, role))
}
