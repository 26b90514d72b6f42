/// Authentication and role-gate layers
///
/// These run as route layers, ahead of every extractor, so a rejected
/// request never has its body read.
///
/// ```text
/// request ─► require_auth ─► require_<role> ─► handler(Extension<Identity>)
///              │ 401             │ 403
/// ```
///
/// `require_auth` verifies the bearer token and stores the [`Identity`] in
/// the request extensions; handlers take it with `Extension<Identity>` and
/// pass it on explicitly.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use eventhub_shared::{
    auth::{
        authorization::require_role,
        middleware::{authenticate, AuthError, Identity},
    },
    models::user::Role,
};

use crate::{app::AppState, error::ApiError};

/// Verifies the `Authorization: Bearer <token>` header
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidFormat)?),
        None => None,
    };

    let identity = authenticate(header, &state.tokens)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Admits only organizers; must sit inside [`require_auth`]
pub async fn require_organizer(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(req.extensions().get::<Identity>(), Role::Organizer)?;
    Ok(next.run(req).await)
}

/// Admits only participants; must sit inside [`require_auth`]
pub async fn require_participant(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(req.extensions().get::<Identity>(), Role::Participant)?;
    Ok(next.run(req).await)
}
