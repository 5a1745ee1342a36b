//! # Tackboard Shared Library
//!
//! This crate contains the domain core of the Tackboard kanban server: data
//! models, storage engines, the authorization layer, and the board/task
//! services consumed by the API crate.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `store`: Storage traits plus the Postgres and in-memory engines
//! - `auth`: Authentication and authorization utilities
//! - `services`: Board and task services with activity recording
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Tackboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
