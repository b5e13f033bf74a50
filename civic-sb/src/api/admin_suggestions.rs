//! Staff suggestion queue endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use tracing::info;

use super::auth::require_staff;
use crate::models::{SuggestionFilter, SuggestionQuery, SuggestionStats, SuggestionUpdate};
use crate::pagination::{PageQuery, Paginated};
use crate::services::SuggestionView;
use crate::{ApiResult, AppState};

/// GET /admin/suggestions
///
/// Filters: `category`, `status`, `assignedDepartment`, `q`, `from`, `to`.
pub async fn list_suggestions(
    State(state): State<AppState>,
    page: Result<Query<PageQuery>, QueryRejection>,
    query: Result<Query<SuggestionQuery>, QueryRejection>,
) -> ApiResult<Json<Paginated<SuggestionView>>> {
    let Query(page) = page?;
    let Query(query) = query?;
    let filter = SuggestionFilter::try_from(query)?;

    Ok(Json(state.suggestions.list_admin(&filter, page.into()).await?))
}

/// GET /admin/suggestions/stats
pub async fn suggestion_stats(State(state): State<AppState>) -> ApiResult<Json<SuggestionStats>> {
    Ok(Json(state.suggestions.stats().await?))
}

/// GET /admin/suggestions/:id
pub async fn get_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuggestionView>> {
    Ok(Json(state.suggestions.get(&id).await?))
}

/// PATCH /admin/suggestions/:id
///
/// Body fields (all optional): `status`, `category`, `assignedDepartment`,
/// `assignedTo`, `actionTaken`. `null` clears the nullable ones.
pub async fn update_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SuggestionUpdate>, JsonRejection>,
) -> ApiResult<Json<SuggestionView>> {
    let Json(update) = payload?;
    Ok(Json(state.suggestions.update_fields(&id, update).await?))
}

/// DELETE /admin/suggestions/:id
pub async fn delete_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.suggestions.delete(&id).await?;
    info!("Suggestion {} removed by staff", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Build staff routes
pub fn admin_suggestion_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/suggestions", get(list_suggestions))
        .route("/admin/suggestions/stats", get(suggestion_stats))
        .route(
            "/admin/suggestions/:id",
            get(get_suggestion)
                .patch(update_suggestion)
                .delete(delete_suggestion),
        )
        .route_layer(middleware::from_fn(require_staff))
}
