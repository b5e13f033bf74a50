//! Department assignment validation
//!
//! A suggestion may only be routed to a department that exists and is
//! active at the moment of assignment. Deactivating a department later does
//! not touch suggestions already assigned to it.

use civic_common::{Error, Result};
use sqlx::SqliteConnection;

use super::registry;

/// Check that `name` names an active department and return the stored name
///
/// Matching is exact on the trimmed input. Run this on the same connection
/// (normally the same transaction) as the write that records the assignment.
pub async fn validate_assignment(conn: &mut SqliteConnection, name: &str) -> Result<String> {
    let wanted = name.trim();
    if wanted.is_empty() {
        return Err(Error::InvalidArgument(
            "Department name must not be empty".to_string(),
        ));
    }

    match registry::lookup_active(conn, wanted).await {
        Ok(department) => Ok(department.name),
        Err(Error::NotFound(_)) => Err(Error::InvalidArgument(format!(
            "Invalid or inactive department: {}",
            wanted
        ))),
        Err(e) => Err(e),
    }
}
