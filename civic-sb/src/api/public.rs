//! Unauthenticated read endpoints

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::models::{normalize_text, Department, DepartmentFilter};
use crate::pagination::{PageQuery, Paginated};
use crate::services::{registry, TrackView};
use crate::{ApiResult, AppState};

/// Text search accepted by department listings
#[derive(Debug, Default, Deserialize)]
pub struct DepartmentSearch {
    pub q: Option<String>,
}

/// GET /public/resolved
///
/// Resolved suggestions, most recently updated first, as tracking views.
pub async fn list_resolved(
    State(state): State<AppState>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Paginated<TrackView>>> {
    let Query(page) = page?;
    Ok(Json(state.suggestions.list_resolved(page.into()).await?))
}

/// GET /departments
///
/// Active departments only, for the submission form's routing picker.
pub async fn list_active_departments(
    State(state): State<AppState>,
    page: Result<Query<PageQuery>, QueryRejection>,
    search: Result<Query<DepartmentSearch>, QueryRejection>,
) -> ApiResult<Json<Paginated<Department>>> {
    let Query(page) = page?;
    let Query(search) = search?;

    let filter = DepartmentFilter {
        active: Some(true),
        text: normalize_text(search.q),
    };
    Ok(Json(registry::list(&state.db, &filter, page.into()).await?))
}

/// Build public routes
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/public/resolved", get(list_resolved))
        .route("/departments", get(list_active_departments))
}
