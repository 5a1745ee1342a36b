/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me)
/// - `boards`: Board lifecycle endpoints
/// - `members`: Board membership endpoints
/// - `activity`: Board activity feed endpoint
/// - `tasks`: Task endpoints including bulk reorder

pub mod health;
pub mod auth;
pub mod boards;
pub mod members;
pub mod activity;
pub mod tasks;

use serde::{Deserialize, Serialize};

/// Bare acknowledgement body for deletions and bulk writes
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    /// Always `true`
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}
