/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: session token issuing and verification
/// - [`middleware`]: `Authorization` header to [`middleware::Identity`]
/// - [`authorization`]: role gate and ownership checks
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, salted per hash, PHC format
/// - **Session Tokens**: HS256, 8 hour lifetime, zero clock leeway
/// - **Ownership**: always re-read from storage, never taken from the request
///
/// # Example
///
/// ```
/// use eventhub_shared::auth::password::{hash_password, verify_password};
/// use eventhub_shared::auth::jwt::TokenKeys;
/// use eventhub_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let keys = TokenKeys::new("a-secret-that-is-at-least-32-bytes-long")?;
/// let token = keys.issue(Uuid::new_v4(), Role::Participant)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
