//! Submitter-facing suggestion endpoints
//!
//! POST /suggestions takes `multipart/form-data` with the text fields
//! `category`, `description`, `anonymous` and `assignedDepartment`, plus up
//! to the configured number of `media` file parts.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use axum::extract::rejection::QueryRejection;
use civic_common::api::Identity;
use civic_common::Error;
use tracing::debug;

use super::auth::require_user;
use crate::models::{MediaUpload, NewSubmission};
use crate::pagination::{PageQuery, Paginated};
use crate::services::{SuggestionView, TrackView};
use crate::{ApiResult, AppState};

/// Allowance for multipart framing and text fields on top of the media limit
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

fn parse_flag(name: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(Error::InvalidArgument(format!(
            "Field '{}' must be a boolean, got '{}'",
            name, other
        ))),
    }
}

/// Drain the multipart stream into a submission
async fn read_submission(mut multipart: Multipart, submitter: Option<Identity>) -> ApiResult<NewSubmission> {
    let mut submission = NewSubmission {
        submitter,
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "category" => submission.category = field.text().await?,
            "description" => submission.description = field.text().await?,
            "anonymous" => submission.anonymous = parse_flag(&name, &field.text().await?)?,
            "assignedDepartment" => submission.assigned_department = Some(field.text().await?),
            "media" => {
                let file_name = field.file_name().unwrap_or("upload").trim().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                submission.media.push(MediaUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!("Ignoring unexpected multipart field '{}'", other),
        }
    }

    Ok(submission)
}

/// POST /suggestions
///
/// Anonymous submissions need no credential; named ones need a bearer
/// token. Returns 201 with the stored record.
pub async fn submit_suggestion(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<SuggestionView>)> {
    let submission = read_submission(multipart?, identity.map(|Extension(id)| id)).await?;
    let view = state.suggestions.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /suggestions/my
pub async fn list_my_suggestions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Paginated<SuggestionView>>> {
    let Query(page) = page?;
    let result = state
        .suggestions
        .list_mine(&identity.subject_id, page.into())
        .await?;
    Ok(Json(result))
}

/// GET /suggestions/track/:id
pub async fn track_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TrackView>> {
    Ok(Json(state.suggestions.track(&id).await?))
}

/// Build submitter routes
pub fn suggestion_routes(state: &AppState) -> Router<AppState> {
    let body_limit = state
        .uploads
        .max_total_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let submit = Router::new()
        .route("/suggestions", post(submit_suggestion))
        .layer(DefaultBodyLimit::max(body_limit));

    let mine = Router::new()
        .route("/suggestions/my", get(list_my_suggestions))
        .route_layer(middleware::from_fn(require_user));

    Router::new()
        .merge(submit)
        .merge(mine)
        .route("/suggestions/track/:id", get(track_suggestion))
}
