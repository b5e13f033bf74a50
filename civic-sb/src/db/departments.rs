//! Department registry queries

use civic_common::time::{parse_storage, to_storage};
use civic_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::{fold, fold_opt, is_unique_violation};
use crate::models::{Department, DepartmentFilter};
use crate::pagination::Pagination;

const COLUMNS: &str =
    "id, name, description, head, email, phone, is_active, created_at, updated_at";

fn department_from_row(row: &SqliteRow) -> Result<Department> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Department {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        head: row.try_get("head")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
        created_at: parse_storage(&created_at)?,
        updated_at: parse_storage(&updated_at)?,
    })
}

/// Insert a new department
///
/// A duplicate name surfaces as `Conflict`, also when a concurrent insert
/// won the race past the caller's existence check.
pub async fn insert(conn: &mut SqliteConnection, department: &Department) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO departments (
            id, name, description, head, email, phone, is_active,
            name_folded, description_folded, head_folded, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&department.id)
    .bind(&department.name)
    .bind(&department.description)
    .bind(&department.head)
    .bind(&department.email)
    .bind(&department.phone)
    .bind(department.is_active as i64)
    .bind(fold(&department.name))
    .bind(fold_opt(department.description.as_deref()))
    .bind(fold_opt(department.head.as_deref()))
    .bind(to_storage(&department.created_at))
    .bind(to_storage(&department.updated_at))
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!("Department '{}' already exists", department.name))
        } else {
            Error::Database(e)
        }
    })?;

    Ok(())
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Department>> {
    let row = sqlx::query(&format!("SELECT {} FROM departments WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(department_from_row).transpose()
}

/// Exact, case-sensitive lookup on the stored name
pub async fn get_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Department>> {
    let row = sqlx::query(&format!("SELECT {} FROM departments WHERE name = ?", COLUMNS))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(department_from_row).transpose()
}

/// Lookup that only returns active departments
pub async fn find_active_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Department>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM departments WHERE name = ? AND is_active = 1",
        COLUMNS
    ))
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(department_from_row).transpose()
}

/// Persist the mutable fields of an existing department
pub async fn update(conn: &mut SqliteConnection, department: &Department) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE departments
        SET description = ?, head = ?, email = ?, phone = ?, is_active = ?,
            description_folded = ?, head_folded = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&department.description)
    .bind(&department.head)
    .bind(&department.email)
    .bind(&department.phone)
    .bind(department.is_active as i64)
    .bind(fold_opt(department.description.as_deref()))
    .bind(fold_opt(department.head.as_deref()))
    .bind(to_storage(&department.updated_at))
    .bind(&department.id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Hard delete; callers check references first
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Number of suggestions assigned to the named department
pub async fn count_references(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suggestions WHERE assigned_department = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &DepartmentFilter) {
    if let Some(active) = filter.active {
        qb.push(" AND is_active = ").push_bind(active as i64);
    }

    if let Some(text) = &filter.text {
        let needle = fold(text);
        qb.push(" AND (instr(name_folded, ")
            .push_bind(needle.clone())
            .push(") > 0 OR instr(description_folded, ")
            .push_bind(needle.clone())
            .push(") > 0 OR instr(head_folded, ")
            .push_bind(needle)
            .push(") > 0)");
    }
}

/// Filtered page of departments ordered by name, plus the unpaged total
pub async fn list(
    pool: &SqlitePool,
    filter: &DepartmentFilter,
    pagination: Pagination,
) -> Result<(Vec<Department>, i64)> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM departments WHERE 1 = 1");
    push_filter(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {} FROM departments WHERE 1 = 1", COLUMNS));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY name ASC, id ASC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset);

    let rows = qb.build().fetch_all(pool).await?;
    let departments = rows.iter().map(department_from_row).collect::<Result<Vec<_>>>()?;

    Ok((departments, total))
}
