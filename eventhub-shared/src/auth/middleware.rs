/// Request authentication
///
/// Turns an `Authorization` header into a verified [`Identity`]. The HTTP
/// layer runs this once per request and hands the resulting identity to
/// every downstream authorization check explicitly; there is no ambient
/// "current user".
///
/// # Example
///
/// ```
/// use eventhub_shared::auth::{jwt::TokenKeys, middleware::authenticate};
/// use eventhub_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new("a-secret-that-is-at-least-32-bytes-long")?;
/// let token = keys.issue(Uuid::new_v4(), Role::Organizer)?;
///
/// let header = format!("Bearer {}", token);
/// let identity = authenticate(Some(&header), &keys)?;
/// assert_eq!(identity.role, Role::Organizer);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{JwtError, TokenKeys};
use crate::models::user::Role;

/// Verified `{user_id, role}` recovered from a session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Why a request could not be authenticated
///
/// Every variant means "unauthenticated"; they differ only in the message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            _ => AuthError::InvalidToken,
        }
    }
}

/// Extracts the token from a `Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidFormat)?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Authenticates a raw `Authorization` header value
pub fn authenticate(header: Option<&str>, keys: &TokenKeys) -> Result<Identity, AuthError> {
    let token = bearer_token(header)?;
    let identity = keys.verify(token)?;

    tracing::debug!(user_id = %identity.user_id, role = %identity.role, "Request authenticated");
    Ok(identity)
}
