/// Board service
///
/// Board lifecycle, membership management, and activity reads. Owns the
/// authorization decisions for every board-level operation:
///
/// - reads require any resolvable role on the board
/// - rename and delete require `OWNER`
/// - membership mutations require `OWNER`, and the owner's own membership
///   row can never be changed or removed through them
///
/// Board deletion cascades: memberships, tasks, and activity records go
/// with the board.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::authorization::{require_access, require_role, AuthzError};
use crate::models::activity::{Activity, ActivityEvent, DEFAULT_ACTIVITY_LIMIT};
use crate::models::board::{Board, CreateBoard};
use crate::models::membership::{BoardRole, MemberWithUser, Membership};
use crate::models::user::UserSummary;
use crate::store::{DataStore, StoreError};

use super::record_activity;

/// Error type for board operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The board does not exist
    #[error("Board {0} not found")]
    NotFound(Uuid),

    /// No registered user matches the invited email
    #[error("No user registered with email {0}")]
    UserNotFound(String),

    /// The membership row does not exist on this board
    #[error("Member {0} not found on this board")]
    MemberNotFound(Uuid),

    /// The target membership is the owner's, which is immutable
    #[error("The owner membership cannot be changed or removed")]
    OwnerImmutable,

    /// The requested role cannot be assigned through this operation
    #[error("Role {0} cannot be assigned to a member")]
    RoleNotAssignable(BoardRole),

    /// Authorization failure
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// A board annotated with the viewer's role, as returned by board listings
#[derive(Debug, Clone, Serialize)]
pub struct BoardWithRole {
    #[serde(flatten)]
    pub board: Board,

    /// The board owner's identity, when resolvable
    pub owner: Option<UserSummary>,

    /// The requesting user's role on this board
    pub my_role: BoardRole,
}

/// Full board view: record, owner identity, member list, viewer's role
#[derive(Debug, Clone, Serialize)]
pub struct BoardDetail {
    pub board: Board,
    pub owner: Option<UserSummary>,
    pub members: Vec<MemberWithUser>,
    pub my_role: BoardRole,
}

/// Board operations over a [`DataStore`]
#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn DataStore>,
}

impl BoardService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Creates a board owned by the actor
    ///
    /// The board and its `OWNER` membership are created atomically, then a
    /// `BOARD_CREATED` activity is recorded.
    pub async fn create_board(&self, actor_id: Uuid, name: String) -> Result<Board, BoardError> {
        let (board, _membership) = self
            .store
            .create_board_with_owner(CreateBoard {
                name,
                owner_id: actor_id,
            })
            .await?;

        tracing::info!(board_id = %board.id, owner_id = %actor_id, "Board created");
        record_activity(
            self.store.as_ref(),
            board.id,
            actor_id,
            ActivityEvent::BoardCreated,
        )
        .await;

        Ok(board)
    }

    /// Lists every board the user owns or belongs to, newest first
    ///
    /// Each board carries the owner's identity and the user's own role, so
    /// clients render a listing without per-board follow-up queries.
    pub async fn list_boards(&self, user_id: Uuid) -> Result<Vec<BoardWithRole>, BoardError> {
        let (boards, memberships) = self.store.list_boards_for_user(user_id).await?;

        let mut owner_ids: Vec<Uuid> = boards.iter().map(|b| b.owner_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();
        let owner_map: HashMap<Uuid, UserSummary> = self
            .store
            .find_users_by_ids(&owner_ids)
            .await?
            .iter()
            .map(|u| (u.id, u.summary()))
            .collect();

        let role_map: HashMap<Uuid, BoardRole> =
            memberships.iter().map(|m| (m.board_id, m.role)).collect();

        Ok(boards
            .into_iter()
            .map(|board| {
                let my_role = if board.owner_id == user_id {
                    BoardRole::Owner
                } else {
                    role_map.get(&board.id).copied().unwrap_or(BoardRole::Viewer)
                };
                BoardWithRole {
                    owner: owner_map.get(&board.owner_id).cloned(),
                    my_role,
                    board,
                }
            })
            .collect())
    }

    /// Fetches a board with its owner identity and member list
    ///
    /// Requires any role on the board.
    pub async fn get_board(&self, actor_id: Uuid, board_id: Uuid) -> Result<BoardDetail, BoardError> {
        let (board, my_role) = require_access(self.store.as_ref(), actor_id, board_id).await?;

        let members = self.members_with_users(board_id).await?;
        let owner = self
            .store
            .find_user_by_id(board.owner_id)
            .await?
            .map(|u| u.summary());

        Ok(BoardDetail {
            board,
            owner,
            members,
            my_role,
        })
    }

    /// Renames a board. Owner only
    pub async fn rename_board(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        name: &str,
    ) -> Result<Board, BoardError> {
        require_role(self.store.as_ref(), actor_id, board_id, &[BoardRole::Owner]).await?;

        let board = self
            .store
            .update_board_name(board_id, name)
            .await?
            .ok_or(BoardError::NotFound(board_id))?;

        tracing::info!(board_id = %board.id, "Board renamed");
        Ok(board)
    }

    /// Deletes a board and everything on it. Owner only
    ///
    /// Memberships, tasks, and activity records are removed with the board;
    /// no orphaned rows remain.
    pub async fn delete_board(&self, actor_id: Uuid, board_id: Uuid) -> Result<(), BoardError> {
        require_role(self.store.as_ref(), actor_id, board_id, &[BoardRole::Owner]).await?;

        if !self.store.delete_board(board_id).await? {
            return Err(BoardError::NotFound(board_id));
        }

        tracing::info!(board_id = %board_id, actor_id = %actor_id, "Board deleted");
        Ok(())
    }

    /// Invites a registered user onto the board by email. Owner only
    ///
    /// New members start as `VIEWER`. The operation is idempotent: inviting
    /// someone who is already a member returns their existing membership
    /// unchanged, and `MEMBER_ADDED` is recorded only when a membership was
    /// actually created.
    ///
    /// # Errors
    ///
    /// `BoardError::UserNotFound` if no user is registered under the email.
    pub async fn add_member(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        email: &str,
    ) -> Result<Membership, BoardError> {
        require_role(self.store.as_ref(), actor_id, board_id, &[BoardRole::Owner]).await?;

        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| BoardError::UserNotFound(email.to_string()))?;

        let (membership, created) = self
            .store
            .insert_membership(board_id, user.id, BoardRole::Viewer)
            .await?;

        if created {
            tracing::info!(board_id = %board_id, member_user_id = %user.id, "Member added");
            record_activity(
                self.store.as_ref(),
                board_id,
                actor_id,
                ActivityEvent::MemberAdded {
                    member_user_id: user.id,
                },
            )
            .await;
        }

        Ok(membership)
    }

    /// Lists the board's members with their user identities
    pub async fn list_members(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, BoardError> {
        require_access(self.store.as_ref(), actor_id, board_id).await?;
        self.members_with_users(board_id).await
    }

    /// Changes a member's role between `EDITOR` and `VIEWER`. Owner only
    ///
    /// # Errors
    ///
    /// - `BoardError::RoleNotAssignable` if the requested role is `OWNER`
    /// - `BoardError::MemberNotFound` if the membership is not on this board
    /// - `BoardError::OwnerImmutable` if the target is the owner membership
    pub async fn update_member_role(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        member_id: Uuid,
        role: BoardRole,
    ) -> Result<Membership, BoardError> {
        require_role(self.store.as_ref(), actor_id, board_id, &[BoardRole::Owner]).await?;

        if role == BoardRole::Owner {
            return Err(BoardError::RoleNotAssignable(role));
        }

        let target = self
            .store
            .find_membership_by_id(board_id, member_id)
            .await?
            .ok_or(BoardError::MemberNotFound(member_id))?;

        if target.role == BoardRole::Owner {
            return Err(BoardError::OwnerImmutable);
        }

        let membership = self
            .store
            .update_membership_role(member_id, role)
            .await?
            .ok_or(BoardError::MemberNotFound(member_id))?;

        tracing::info!(
            board_id = %board_id,
            member_id = %member_id,
            role = %membership.role,
            "Member role updated"
        );
        Ok(membership)
    }

    /// Removes a member from the board. Owner only
    ///
    /// The owner membership cannot be removed; deleting the board is the
    /// only way to end it.
    pub async fn remove_member(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), BoardError> {
        require_role(self.store.as_ref(), actor_id, board_id, &[BoardRole::Owner]).await?;

        let target = self
            .store
            .find_membership_by_id(board_id, member_id)
            .await?
            .ok_or(BoardError::MemberNotFound(member_id))?;

        if target.role == BoardRole::Owner {
            return Err(BoardError::OwnerImmutable);
        }

        if !self.store.delete_membership(member_id).await? {
            return Err(BoardError::MemberNotFound(member_id));
        }

        tracing::info!(board_id = %board_id, member_id = %member_id, "Member removed");
        Ok(())
    }

    /// Reads the board's activity feed, newest first
    ///
    /// Non-positive or absent limits fall back to the default of
    /// [`DEFAULT_ACTIVITY_LIMIT`] records.
    pub async fn list_activity(
        &self,
        actor_id: Uuid,
        board_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Activity>, BoardError> {
        require_access(self.store.as_ref(), actor_id, board_id).await?;

        let limit = match limit {
            Some(n) if n > 0 => n,
            _ => DEFAULT_ACTIVITY_LIMIT,
        };

        Ok(self.store.list_activities(board_id, limit).await?)
    }

    async fn members_with_users(&self, board_id: Uuid) -> Result<Vec<MemberWithUser>, BoardError> {
        let memberships = self.store.list_memberships(board_id).await?;

        let user_ids: Vec<Uuid> = memberships.iter().map(|m| m.user_id).collect();
        let user_map: HashMap<Uuid, UserSummary> = self
            .store
            .find_users_by_ids(&user_ids)
            .await?
            .iter()
            .map(|u| (u.id, u.summary()))
            .collect();

        Ok(memberships
            .into_iter()
            .map(|m| {
                let user = user_map.get(&m.user_id).cloned().unwrap_or(UserSummary {
                    id: m.user_id,
                    name: "Unknown".to_string(),
                    email: String::new(),
                });
                MemberWithUser {
                    id: m.id,
                    board_id: m.board_id,
                    role: m.role,
                    user,
                }
            })
            .collect())
    }
}
