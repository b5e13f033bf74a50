//! Settings table accessors
//!
//! Key/value runtime settings stored as text and parsed on read.

use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Read a setting and parse it into `T`
///
/// Returns `None` when the key is missing or its value is NULL.
pub async fn get_setting<T>(db: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value.flatten() {
        Some(value) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Insert or replace a setting
pub async fn set_setting<T>(db: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

/// Ensure a setting exists, writing `default_value` when missing or NULL
///
/// Returns the effective value.
pub async fn ensure_setting(db: &SqlitePool, key: &str, default_value: &str) -> Result<String> {
    // INSERT OR IGNORE tolerates two processes initializing at once
    let inserted = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(db)
        .await?
        .rows_affected();

    if inserted > 0 {
        info!("Initialized setting '{}'", key);
        return Ok(default_value.to_string());
    }

    match get_setting::<String>(db, key).await? {
        Some(value) => Ok(value),
        None => {
            set_setting(db, key, default_value).await?;
            info!("Setting '{}' was NULL, reset to default", key);
            Ok(default_value.to_string())
        }
    }
}
