//! Department registry administration endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::auth::require_admin;
use crate::models::{normalize_text, CreateDepartment, Department, DepartmentFilter, UpdateDepartment};
use crate::pagination::{PageQuery, Paginated};
use crate::services::registry;
use crate::{ApiResult, AppState};

/// Registry list filters
#[derive(Debug, Default, Deserialize)]
pub struct DepartmentListQuery {
    pub active: Option<bool>,
    pub q: Option<String>,
}

/// POST /admin/departments
pub async fn create_department(
    State(state): State<AppState>,
    payload: Result<Json<CreateDepartment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    let Json(input) = payload?;
    let department = registry::create(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// GET /admin/departments
pub async fn list_departments(
    State(state): State<AppState>,
    page: Result<Query<PageQuery>, QueryRejection>,
    query: Result<Query<DepartmentListQuery>, QueryRejection>,
) -> ApiResult<Json<Paginated<Department>>> {
    let Query(page) = page?;
    let Query(query) = query?;

    let filter = DepartmentFilter {
        active: query.active,
        text: normalize_text(query.q),
    };
    Ok(Json(registry::list(&state.db, &filter, page.into()).await?))
}

/// GET /admin/departments/:id
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Department>> {
    Ok(Json(registry::get(&state.db, &id).await?))
}

/// PATCH /admin/departments/:id
pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDepartment>, JsonRejection>,
) -> ApiResult<Json<Department>> {
    let Json(changes) = payload?;
    Ok(Json(registry::update(&state.db, &id, changes).await?))
}

/// POST /admin/departments/:id/deactivate
///
/// Idempotent; returns the department in its retired state.
pub async fn deactivate_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Department>> {
    Ok(Json(registry::deactivate(&state.db, &id).await?))
}

/// DELETE /admin/departments/:id
///
/// 409 while any suggestion still references the department.
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    registry::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build admin registry routes
pub fn admin_department_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/departments",
            post(create_department).get(list_departments),
        )
        .route(
            "/admin/departments/:id",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
        .route("/admin/departments/:id/deactivate", post(deactivate_department))
        .route_layer(middleware::from_fn(require_admin))
}
