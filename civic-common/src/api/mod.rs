//! Shared API primitives
//!
//! Contains ONLY pure functions, database operations and shared types.
//! Each service wraps these with its own axum middleware.

pub mod auth;

pub use auth::{bearer_token, issue_token, load_token_secret, verify_token, Identity, Role};
