//! Bearer authentication middleware
//!
//! `identify` runs on every request and stores the verified `Identity` in
//! the request extensions. The `require_*` layers then gate route groups by
//! role: no identity is 401, a weaker role is 403.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use civic_common::api::{bearer_token, Identity};
use civic_common::Error;
use tracing::debug;

use crate::{ApiError, AppState};

/// Resolve the caller from `Authorization: Bearer <token>`, if present
pub async fn identify(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .ok()
                .and_then(bearer_token)
                .map(str::to_string)
                .ok_or_else(|| Error::Unauthorized("Malformed Authorization header".to_string()))?,
        ),
        None => None,
    };

    if let Some(token) = token {
        let identity = state.identity.authenticate(&token).await.map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            e
        })?;
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}

fn caller(request: &Request) -> Result<&Identity, ApiError> {
    request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| Error::Unauthorized("Authentication required".to_string()).into())
}

/// Any authenticated caller
pub async fn require_user(request: Request, next: Next) -> Result<Response, ApiError> {
    caller(&request)?;
    Ok(next.run(request).await)
}

/// Staff, admin or superadmin
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    if !caller(&request)?.role.is_staff() {
        return Err(Error::Forbidden("Staff role required".to_string()).into());
    }
    Ok(next.run(request).await)
}

/// Admin or superadmin
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    if !caller(&request)?.role.is_admin() {
        return Err(Error::Forbidden("Admin role required".to_string()).into());
    }
    Ok(next.run(request).await)
}
