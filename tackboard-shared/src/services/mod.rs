/// Domain services
///
/// Services compose authorization, storage, and activity recording into the
/// operations the HTTP layer exposes:
///
/// - [`boards`]: board lifecycle, membership management, activity reads
/// - [`tasks`]: task CRUD and bulk reordering
///
/// Every mutation records at most one activity event describing what
/// changed. The primary write is authoritative: if the activity append
/// fails after the write committed, the loss is logged and the operation
/// still succeeds.

use uuid::Uuid;

use crate::models::activity::ActivityEvent;
use crate::store::ActivityStore;

pub mod boards;
pub mod tasks;

pub use boards::{BoardDetail, BoardError, BoardService, BoardWithRole};
pub use tasks::{TaskError, TaskService};

/// Appends an activity record, tolerating failure
///
/// Called after the primary write has committed, so a failed append must
/// not fail the operation. The loss is logged instead.
pub(crate) async fn record_activity<S>(
    store: &S,
    board_id: Uuid,
    actor_id: Uuid,
    event: ActivityEvent,
) where
    S: ActivityStore + ?Sized,
{
    if let Err(error) = store.append_activity(board_id, actor_id, &event).await {
        tracing::warn!(
            board_id = %board_id,
            actor_id = %actor_id,
            kind = event.kind(),
            error = %error,
            "Failed to record activity"
        );
    }
}
