//! # Civic Common Library
//!
//! Shared code for the civic services including:
//! - Error taxonomy
//! - Bootstrap configuration and root folder resolution
//! - Database initialization and settings access
//! - Bearer token primitives
//! - Timestamp utilities

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
