/// Bearer authentication independent of the HTTP framework
///
/// The API server's auth layer hands the raw `Authorization` header to
/// [`authenticate_bearer`] and stores the resulting [`AuthContext`] in the
/// request extensions.
///
/// # Example
///
/// ```
/// use hamayesh_shared::auth::middleware::{authenticate_bearer, AuthError};
///
/// let err = authenticate_bearer(None, "secret").unwrap_err();
/// assert!(matches!(err, AuthError::MissingCredentials));
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};

/// Identity of the administrator making a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (the token subject)
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token rejected
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

/// Extracts the token from a `Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Validates an `Authorization` header value and returns the caller's context
///
/// # Errors
///
/// - `MissingCredentials` if the header is absent
/// - `InvalidFormat` if it is not a bearer header
/// - `InvalidToken` if the token fails validation or is not an access token
pub fn authenticate_bearer(header: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(header)?;
    let claims = validate_access_token(token, secret)?;
    Ok(AuthContext::from_jwt(claims.sub))
}
