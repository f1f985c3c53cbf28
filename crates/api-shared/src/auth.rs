//! Bearer-token authentication for API requests.
//!
//! Every request is authenticated independently: the access token from the `Authorization`
//! header is resolved through the backend's session lookup into a fresh [`AuthContext`].

use openroom_core::{AuthContext, BackendClient, User};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header must be 'Bearer <token>'")]
    Malformed,
    #[error("session expired or invalid")]
    UnknownSession,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, BearerError> {
    let header = header.ok_or(BearerError::Missing)?;
    let (scheme, token) = header.trim().split_once(' ').ok_or(BearerError::Malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token)
}

/// Resolves the `Authorization` header into a signed-in auth context.
pub fn authenticate(
    client: &BackendClient,
    header: Option<&str>,
) -> Result<AuthContext, BearerError> {
    let token = bearer_token(header)?;
    let mut auth = AuthContext::new(client.clone());
    auth.restore(Some(token));
    if auth.user().is_none() {
        tracing::debug!("rejecting request with unknown session");
        return Err(BearerError::UnknownSession);
    }
    Ok(auth)
}

/// The signed-in user of an authenticated context.
pub fn viewer(auth: &AuthContext) -> Result<&User, BearerError> {
    auth.user().ok_or(BearerError::UnknownSession)
}
