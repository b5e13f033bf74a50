//! Bearer token primitives
//!
//! HS256 JWTs carry the caller's subject id and role. This module contains
//! only pure functions plus the secret bootstrap; HTTP middleware lives in
//! the service crates.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::settings::{ensure_setting, set_setting};
use crate::{Error, Result};

/// Settings key holding the generated signing secret
pub const TOKEN_SECRET_KEY: &str = "token_secret";

/// Caller role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Staff,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    /// Roles allowed to work the suggestion queue
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin | Role::SuperAdmin)
    }

    /// Roles allowed to maintain the department registry
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::SuperAdmin),
            other => Err(Error::InvalidArgument(format!("Unknown role: {}", other))),
        }
    }
}

/// Resolved caller identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: String,
    pub role: Role,
}

/// JWT claims embedded in every bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed HS256 token
pub fn issue_token(
    subject_id: &str,
    role: Role,
    secret: &str,
    issuer: &str,
    ttl_secs: u64,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let exp = i64::try_from(ttl_secs)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or_else(|| Error::InvalidArgument(format!("Token lifetime too large: {} seconds", ttl_secs)))?;
    let claims = Claims {
        sub: subject_id.to_string(),
        role,
        iss: issuer.to_string(),
        iat: now,
        exp,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Token encode failed: {}", e)))
}

/// Verify a token's signature, issuer and expiry
pub fn verify_token(token: &str, secret: &str, issuer: &str) -> Result<Identity> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iss"]);

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            Error::Unauthorized("Token expired".to_string())
        }
        _ => Error::Unauthorized(format!("Invalid token: {}", e)),
    })?;

    if data.claims.sub.trim().is_empty() {
        return Err(Error::Unauthorized("Token has an empty subject".to_string()));
    }

    Ok(Identity {
        subject_id: data.claims.sub,
        role: data.claims.role,
    })
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the signing secret
///
/// A secret from the bootstrap config wins. Otherwise the secret stored in
/// the settings table is used, generating and persisting a random one on
/// first start.
pub async fn load_token_secret(db: &SqlitePool, configured: Option<&str>) -> Result<String> {
    if let Some(secret) = configured.filter(|s| !s.trim().is_empty()) {
        return Ok(secret.to_string());
    }

    let candidate: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect();

    // An existing stored secret wins over the fresh candidate
    let stored = ensure_setting(db, TOKEN_SECRET_KEY, &candidate).await?;
    let secret = if stored.trim().is_empty() {
        set_setting(db, TOKEN_SECRET_KEY, &candidate).await?;
        candidate.clone()
    } else {
        stored
    };

    if secret == candidate {
        info!("Generated new token signing secret");
    }

    Ok(secret)
}
