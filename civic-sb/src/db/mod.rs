//! Database access for the suggestion box
//!
//! Schema creation lives in `civic_common::db::init`; this module holds the
//! queries. Functions that must run inside a caller's transaction take a
//! `&mut SqliteConnection`, list queries take the pool.

pub mod departments;
pub mod suggestions;

use civic_common::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Open a transaction holding the write lock from its first statement
///
/// A deferred transaction that reads before it writes cannot upgrade its
/// lock while another writer is active and fails with SQLITE_BUSY at once.
/// `BEGIN IMMEDIATE` waits on the busy timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Case-folded copy of free text, stored next to the original for search
///
/// SQLite's `LIKE` and `lower()` fold ASCII only, so text search compares
/// folded columns against a folded needle with `instr`.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

pub(crate) fn fold_opt(text: Option<&str>) -> Option<String> {
    text.map(fold)
}

/// True when a sqlx error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_common::db::init_database;
    use tempfile::TempDir;

    #[test]
    fn test_fold_handles_non_ascii() {
        assert_eq!(fold("ÉCOLE Library"), "école library");
        assert_eq!(fold("ÇAY OCAĞI"), "çay ocaği");
        assert_eq!(fold_opt(None), None);
        assert_eq!(fold_opt(Some("Åsa")).as_deref(), Some("åsa"));
    }

    #[tokio::test]
    async fn test_begin_write_takes_lock_up_front() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("civic.db")).await.unwrap();

        let mut tx = begin_write(&pool).await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('k', 'v')")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let value: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = 'k'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(value, "v");
    }
}
