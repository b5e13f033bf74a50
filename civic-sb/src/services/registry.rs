//! Department registry
//!
//! Departments are referenced by name from suggestions, so the name is fixed
//! at creation. A referenced department can only be retired through
//! `deactivate`; `delete` is reserved for entries nothing points at.

use civic_common::time::now;
use civic_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::db::{begin_write, departments};
use crate::models::department::NAME_MAX_CHARS;
use crate::models::normalize_text;
use crate::models::{CreateDepartment, Department, DepartmentFilter, UpdateDepartment};
use crate::pagination::{Paginated, Pagination};

fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    let chars = name.chars().count();
    if chars == 0 || chars > NAME_MAX_CHARS {
        return Err(Error::InvalidArgument(format!(
            "Department name must be 1 to {} characters",
            NAME_MAX_CHARS
        )));
    }
    Ok(name.to_string())
}

fn validate_email(email: Option<String>) -> Result<Option<String>> {
    let Some(email) = normalize_text(email) else {
        return Ok(None);
    };
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Some(email)),
        _ => Err(Error::InvalidArgument(format!("Invalid email address: {}", email))),
    }
}

pub async fn create(pool: &SqlitePool, input: CreateDepartment) -> Result<Department> {
    let name = validate_name(&input.name)?;
    let email = validate_email(input.email)?;
    let timestamp = now();

    let department = Department {
        id: Uuid::new_v4().to_string(),
        name,
        description: normalize_text(input.description),
        head: normalize_text(input.head),
        email,
        phone: normalize_text(input.phone),
        is_active: true,
        created_at: timestamp,
        updated_at: timestamp,
    };

    let mut tx = begin_write(pool).await?;
    if departments::get_by_name(&mut tx, &department.name).await?.is_some() {
        return Err(Error::Conflict(format!(
            "Department '{}' already exists",
            department.name
        )));
    }
    departments::insert(&mut tx, &department).await?;
    tx.commit().await?;

    info!("Created department '{}' ({})", department.name, department.id);
    Ok(department)
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Department> {
    let mut conn = pool.acquire().await?;
    departments::get_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Department not found: {}", id)))
}

/// Active department by exact name
///
/// Takes a connection so assignment checks can run inside the write's
/// transaction.
pub async fn lookup_active(conn: &mut SqliteConnection, name: &str) -> Result<Department> {
    departments::find_active_by_name(conn, name.trim())
        .await?
        .ok_or_else(|| Error::NotFound(format!("No active department named '{}'", name.trim())))
}

/// Retire a department; repeating the call is a no-op
pub async fn deactivate(pool: &SqlitePool, id: &str) -> Result<Department> {
    let mut tx = begin_write(pool).await?;
    let mut department = departments::get_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Department not found: {}", id)))?;

    if department.is_active {
        department.is_active = false;
        department.updated_at = now();
        departments::update(&mut tx, &department).await?;
        info!("Deactivated department '{}'", department.name);
    }

    tx.commit().await?;
    Ok(department)
}

/// Partial update of everything except the name
pub async fn update(pool: &SqlitePool, id: &str, changes: UpdateDepartment) -> Result<Department> {
    let email = match changes.email {
        Some(email) => Some(validate_email(email)?),
        None => None,
    };

    let mut tx = begin_write(pool).await?;
    let mut department = departments::get_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Department not found: {}", id)))?;

    if let Some(description) = changes.description {
        department.description = normalize_text(description);
    }
    if let Some(head) = changes.head {
        department.head = normalize_text(head);
    }
    if let Some(email) = email {
        department.email = email;
    }
    if let Some(phone) = changes.phone {
        department.phone = normalize_text(phone);
    }
    if let Some(active) = changes.is_active {
        department.is_active = active;
    }
    department.updated_at = now();

    departments::update(&mut tx, &department).await?;
    tx.commit().await?;

    Ok(department)
}

/// Hard delete of a department no suggestion refers to
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut tx = begin_write(pool).await?;
    let department = departments::get_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Department not found: {}", id)))?;

    let references = departments::count_references(&mut tx, &department.name).await?;
    if references > 0 {
        return Err(Error::Conflict(format!(
            "Department '{}' is referenced by {} suggestion(s); deactivate it instead",
            department.name, references
        )));
    }

    departments::delete(&mut tx, id).await?;
    tx.commit().await?;

    info!("Deleted department '{}'", department.name);
    Ok(())
}

pub async fn list(
    pool: &SqlitePool,
    filter: &DepartmentFilter,
    pagination: Pagination,
) -> Result<Paginated<Department>> {
    let (items, total) = departments::list(pool, filter, pagination).await?;
    Ok(Paginated::new(items, total, pagination))
}
