/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new organizer or participant
/// - `POST /v1/auth/login` - Exchange credentials for a session token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use eventhub_shared::{
    auth::{jwt::TOKEN_TTL_HOURS, password},
    models::user::{CreateUser, Role, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Message for any credential mismatch; never reveals which part was wrong
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    /// `ORGANIZER` or `PARTICIPANT`
    pub role: Role,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,

    pub user_id: Uuid,
    pub role: Role,

    /// Token lifetime in seconds
    pub expires_in: i64,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ana",
///   "email": "ana@example.com",
///   "password": "correct horse",
///   "role": "ORGANIZER"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the user, without the password hash.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or email already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(mut req) = payload?;
    req.email = normalize_email(&req.email);
    req.name = req.name.trim().to_string();
    req.validate()?;

    if state.repos.users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent registration can still lose on the unique index
    let user = state
        .repos
        .users
        .insert(CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "email": "ana@example.com", "password": "correct horse" }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJ...", "user_id": "uuid", "role": "ORGANIZER", "expires_in": 28800 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(mut req) = payload?;
    req.email = normalize_email(&req.email);
    req.validate()?;

    let user = state
        .repos
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.tokens.issue(user.id, user.role)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        role: user.role,
        expires_in: TOKEN_TTL_HOURS * 3600,
    }))
}
