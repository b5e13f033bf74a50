//! Suggestion store queries
//!
//! Media rows live in `suggestion_media` and are always loaded together
//! with their parent suggestion.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use civic_common::time::{parse_storage, to_storage};
use civic_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::{fold, fold_opt};
use crate::models::{
    Category, MediaAttachment, MediaKind, Status, Suggestion, SuggestionFilter, SuggestionStats,
};
use crate::pagination::Pagination;

const COLUMNS: &str = "id, submitter_id, anonymous, category, description, status, \
                       assigned_department, assigned_to, action_taken, revision, created_at, updated_at";

/// Validated field changes for one update
///
/// `None` leaves a column untouched; for the nullable columns
/// `Some(None)` writes NULL.
#[derive(Debug, Clone, Default)]
pub struct FieldChanges {
    pub status: Option<Status>,
    pub category: Option<Category>,
    pub assigned_department: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
    pub action_taken: Option<Option<String>>,
}

fn suggestion_from_row(row: &SqliteRow, media: Vec<MediaAttachment>) -> Result<Suggestion> {
    let category: String = row.try_get("category")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Suggestion {
        id: row.try_get("id")?,
        submitter_id: row.try_get("submitter_id")?,
        anonymous: row.try_get::<i64, _>("anonymous")? != 0,
        category: category
            .parse()
            .map_err(|_| Error::Internal(format!("Stored category is invalid: {}", category)))?,
        description: row.try_get("description")?,
        status: status
            .parse()
            .map_err(|_| Error::Internal(format!("Stored status is invalid: {}", status)))?,
        assigned_department: row.try_get("assigned_department")?,
        assigned_to: row.try_get("assigned_to")?,
        action_taken: row.try_get("action_taken")?,
        media,
        revision: row.try_get("revision")?,
        created_at: parse_storage(&created_at)?,
        updated_at: parse_storage(&updated_at)?,
    })
}

/// Load attachments for a set of suggestions, keyed by suggestion id
async fn load_media<'e, E>(executor: E, ids: &[String]) -> Result<HashMap<String, Vec<MediaAttachment>>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut by_parent: HashMap<String, Vec<MediaAttachment>> = HashMap::new();
    if ids.is_empty() {
        return Ok(by_parent);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT suggestion_id, kind, url, original_name, content_type, size \
         FROM suggestion_media WHERE suggestion_id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(") ORDER BY suggestion_id, position");

    for row in qb.build().fetch_all(executor).await? {
        let kind: String = row.try_get("kind")?;
        let attachment = MediaAttachment {
            kind: kind.parse::<MediaKind>()?,
            url: row.try_get("url")?,
            original_name: row.try_get("original_name")?,
            content_type: row.try_get("content_type")?,
            size: row.try_get::<i64, _>("size")?.max(0) as u64,
        };
        by_parent
            .entry(row.try_get("suggestion_id")?)
            .or_default()
            .push(attachment);
    }

    Ok(by_parent)
}

fn assemble(rows: Vec<SqliteRow>, mut media: HashMap<String, Vec<MediaAttachment>>) -> Result<Vec<Suggestion>> {
    rows.iter()
        .map(|row| {
            let id: String = row.try_get("id")?;
            suggestion_from_row(row, media.remove(&id).unwrap_or_default())
        })
        .collect()
}

/// Insert a suggestion together with its media rows
///
/// Run inside a transaction so a failing media row leaves no parent behind.
pub async fn insert(conn: &mut SqliteConnection, suggestion: &Suggestion) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO suggestions (
            id, submitter_id, anonymous, category, description, status,
            assigned_department, assigned_to, action_taken, description_folded, action_taken_folded,
            revision, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&suggestion.id)
    .bind(&suggestion.submitter_id)
    .bind(suggestion.anonymous as i64)
    .bind(suggestion.category.as_str())
    .bind(&suggestion.description)
    .bind(suggestion.status.as_str())
    .bind(&suggestion.assigned_department)
    .bind(&suggestion.assigned_to)
    .bind(&suggestion.action_taken)
    .bind(fold(&suggestion.description))
    .bind(fold_opt(suggestion.action_taken.as_deref()))
    .bind(suggestion.revision)
    .bind(to_storage(&suggestion.created_at))
    .bind(to_storage(&suggestion.updated_at))
    .execute(&mut *conn)
    .await?;

    for (position, media) in suggestion.media.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO suggestion_media (suggestion_id, position, kind, url, original_name, content_type, size)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&suggestion.id)
        .bind(position as i64)
        .bind(media.kind.as_str())
        .bind(&media.url)
        .bind(&media.original_name)
        .bind(&media.content_type)
        .bind(media.size as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &str) -> Result<Option<Suggestion>> {
    let row = sqlx::query(&format!("SELECT {} FROM suggestions WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let ids = [id.to_string()];
    let media = load_media(&mut *conn, &ids).await?;
    assemble(vec![row], media).map(|mut found| found.pop())
}

/// Apply field changes, bumping `revision` and `updated_at`
///
/// Returns the number of rows touched (0 when the id is unknown).
pub async fn apply_changes(
    conn: &mut SqliteConnection,
    id: &str,
    changes: &FieldChanges,
    now: DateTime<Utc>,
) -> Result<u64> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE suggestions SET revision = revision + 1, updated_at = ");
    qb.push_bind(to_storage(&now));

    if let Some(status) = changes.status {
        qb.push(", status = ").push_bind(status.as_str());
    }
    if let Some(category) = changes.category {
        qb.push(", category = ").push_bind(category.as_str());
    }
    if let Some(department) = &changes.assigned_department {
        qb.push(", assigned_department = ").push_bind(department.clone());
    }
    if let Some(assignee) = &changes.assigned_to {
        qb.push(", assigned_to = ").push_bind(assignee.clone());
    }
    if let Some(action) = &changes.action_taken {
        qb.push(", action_taken = ").push_bind(action.clone());
        qb.push(", action_taken_folded = ").push_bind(fold_opt(action.as_deref()));
    }

    qb.push(" WHERE id = ").push_bind(id.to_string());

    let result = qb.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Delete a suggestion; media rows go with it through the cascade
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<u64> {
    sqlx::query("DELETE FROM suggestion_media WHERE suggestion_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM suggestions WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SuggestionFilter) {
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(department) = &filter.assigned_department {
        qb.push(" AND assigned_department = ").push_bind(department.clone());
    }
    if let Some(text) = &filter.query {
        let needle = fold(text);
        qb.push(" AND (instr(description_folded, ")
            .push_bind(needle.clone())
            .push(") > 0 OR instr(action_taken_folded, ")
            .push_bind(needle)
            .push(") > 0)");
    }
    if let Some(from) = &filter.created_from {
        qb.push(" AND created_at >= ").push_bind(to_storage(from));
    }
    if let Some(before) = &filter.created_before {
        qb.push(" AND created_at < ").push_bind(to_storage(before));
    }
}

/// Run a filtered, ordered page query and attach media
async fn fetch_page(
    pool: &SqlitePool,
    where_clause: impl Fn(&mut QueryBuilder<'_, Sqlite>),
    order_by: &str,
    pagination: Pagination,
) -> Result<(Vec<Suggestion>, i64)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM suggestions WHERE 1 = 1");
    where_clause(&mut count_qb);
    let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM suggestions WHERE 1 = 1", COLUMNS));
    where_clause(&mut qb);
    qb.push(" ORDER BY ")
        .push(order_by)
        .push(" LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset);

    let rows = qb.build().fetch_all(pool).await?;
    let ids = rows
        .iter()
        .map(|row| row.try_get::<String, _>("id"))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let media = load_media(pool, &ids).await?;

    Ok((assemble(rows, media)?, total))
}

/// Staff list: filtered, newest first
pub async fn list_admin(
    pool: &SqlitePool,
    filter: &SuggestionFilter,
    pagination: Pagination,
) -> Result<(Vec<Suggestion>, i64)> {
    fetch_page(pool, |qb| push_filter(qb, filter), "created_at DESC, id DESC", pagination).await
}

/// Public list: only `Resolved`, most recently updated first
///
/// The id tie-break keeps page boundaries stable for a fixed snapshot.
pub async fn list_resolved(pool: &SqlitePool, pagination: Pagination) -> Result<(Vec<Suggestion>, i64)> {
    fetch_page(
        pool,
        |qb| {
            qb.push(" AND status = ").push_bind(Status::Resolved.as_str());
        },
        "updated_at DESC, id DESC",
        pagination,
    )
    .await
}

/// Suggestions stored with the given submitter, newest first
pub async fn list_by_submitter(
    pool: &SqlitePool,
    submitter_id: &str,
    pagination: Pagination,
) -> Result<(Vec<Suggestion>, i64)> {
    let submitter_id = submitter_id.to_string();
    fetch_page(
        pool,
        |qb| {
            qb.push(" AND anonymous = 0 AND submitter_id = ").push_bind(submitter_id.clone());
        },
        "created_at DESC, id DESC",
        pagination,
    )
    .await
}

async fn grouped_counts(pool: &SqlitePool, sql: &str) -> Result<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Aggregate counts by status, category and department
///
/// Every status and category appears in the result, with zero when unused.
pub async fn stats(pool: &SqlitePool) -> Result<SuggestionStats> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suggestions")
        .fetch_one(pool)
        .await?;
    let unassigned: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM suggestions WHERE assigned_department IS NULL")
            .fetch_one(pool)
            .await?;

    let mut stats = SuggestionStats {
        total,
        unassigned,
        ..Default::default()
    };

    for status in Status::ALL {
        stats.by_status.insert(status.as_str().to_string(), 0);
    }
    for category in Category::ALL {
        stats.by_category.insert(category.as_str().to_string(), 0);
    }

    for (status, count) in
        grouped_counts(pool, "SELECT status, COUNT(*) FROM suggestions GROUP BY status").await?
    {
        stats.by_status.insert(status, count);
    }
    for (category, count) in
        grouped_counts(pool, "SELECT category, COUNT(*) FROM suggestions GROUP BY category").await?
    {
        stats.by_category.insert(category, count);
    }
    for (department, count) in grouped_counts(
        pool,
        "SELECT assigned_department, COUNT(*) FROM suggestions \
         WHERE assigned_department IS NOT NULL GROUP BY assigned_department",
    )
    .await?
    {
        stats.by_department.insert(department, count);
    }

    Ok(stats)
}
