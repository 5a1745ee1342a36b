/// Database models for Tackboard
///
/// This module contains the data structures persisted by the storage engines.
/// Query code lives in `crate::store`; the types here are engine-agnostic.
///
/// # Models
///
/// - `user`: User accounts
/// - `board`: Kanban boards
/// - `membership`: Board membership rows and the role model
/// - `task`: Tasks with status lanes, priorities, and sparse ordering
/// - `activity`: Append-only per-board activity records

pub mod activity;
pub mod board;
pub mod membership;
pub mod task;
pub mod user;
