//! HTTP API handlers for civic-sb

pub mod admin_departments;
pub mod admin_suggestions;
pub mod auth;
pub mod health;
pub mod public;
pub mod suggestions;

pub use admin_departments::admin_department_routes;
pub use admin_suggestions::admin_suggestion_routes;
pub use auth::identify;
pub use health::health_routes;
pub use public::public_routes;
pub use suggestions::suggestion_routes;
