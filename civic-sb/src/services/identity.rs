//! Caller identity resolution

use async_trait::async_trait;
use civic_common::api::{issue_token, verify_token, Identity, Role};
use civic_common::Result;

/// Maps a bearer credential to an identity
///
/// Implementations return `Error::Unauthorized` for anything they cannot
/// verify.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Identity>;
}

/// HS256 JWT verification against a shared secret
#[derive(Clone)]
pub struct JwtIdentityProvider {
    secret: String,
    issuer: String,
}

impl JwtIdentityProvider {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
        }
    }

    /// Mint a token this provider will accept
    pub fn issue(&self, subject_id: &str, role: Role, ttl_secs: u64) -> Result<String> {
        issue_token(subject_id, role, &self.secret, &self.issuer, ttl_secs)
    }
}

impl std::fmt::Debug for JwtIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityProvider")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<Identity> {
        verify_token(token, &self.secret, &self.issuer)
    }
}
