/// Session token issuing and verification
///
/// Tokens are HS256-signed JWTs carrying the user id and role. They are
/// stateless: nothing is persisted, and verification needs only the signing
/// keys, which are derived once from the configured secret and shared
/// read-only for the life of the process.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Lifetime**: 8 hours, no refresh or rotation
/// - **Validation**: signature, issuer, `exp` and `nbf` with zero leeway; a
///   token is rejected from its `exp` second on
///
/// # Example
///
/// ```
/// use eventhub_shared::auth::jwt::TokenKeys;
/// use eventhub_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new("a-secret-that-is-at-least-32-bytes-long")?;
/// let user_id = Uuid::new_v4();
///
/// let token = keys.issue(user_id, Role::Participant)?;
/// let identity = keys.verify(&token)?;
/// assert_eq!(identity.user_id, user_id);
/// assert_eq!(identity.role, Role::Participant);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::middleware::Identity;
use crate::models::user::Role;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "eventhub";

/// Token lifetime in hours
pub const TOKEN_TTL_HOURS: i64 = 8;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// No signing secret configured
    #[error("Signing secret is empty")]
    MissingSecret,

    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Bad signature, wrong issuer or malformed payload
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// JWT claims
///
/// - `sub`: user id
/// - `role`: role at issuance
/// - `iss`: always [`ISSUER`]
/// - `iat` / `nbf` / `exp`: unix timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims issued now, expiring after [`TOKEN_TTL_HOURS`]
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self::issued_at(user_id, role, Utc::now())
    }

    /// Claims as if issued at `at`
    pub fn issued_at(user_id: Uuid, role: Role, at: DateTime<Utc>) -> Self {
        let expiration = at + Duration::hours(TOKEN_TTL_HOURS);

        Self {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: at.timestamp(),
            nbf: at.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// True from the `exp` second on
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub,
            role: self.role,
        }
    }
}

/// Signing and verification keys derived from one secret
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Derives keys from `secret`
    ///
    /// # Errors
    ///
    /// `JwtError::MissingSecret` if the secret is empty or blank
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issues a token for `user_id` with `role`, valid for 8 hours
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, role))
    }

    /// Signs arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and recovers the identity it carries
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        self.decode_claims(token).map(|claims| claims.identity())
    }

    /// Verifies a token and returns the full claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;

        // jsonwebtoken still accepts `now == exp`
        if data.claims.is_expired() {
            return Err(JwtError::Expired);
        }

        Ok(data.claims)
    }
}
