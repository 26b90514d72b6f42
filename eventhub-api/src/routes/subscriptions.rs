/// Subscription endpoints
///
/// - `POST /v1/events/:id/subscribe` - Subscribe the calling participant
/// - `DELETE /v1/subscriptions/:id` - Remove, by the subscriber or the
///   event's organizer

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use eventhub_shared::{
    auth::middleware::Identity,
    models::subscription::Subscription,
    subscriptions,
};
use uuid::Uuid;

/// Subscribe to an event
///
/// # Errors
///
/// - `400 Bad Request` (`conflict`): Already subscribed
/// - `404 Not Found`: No such event
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let Path(event_id) = path?;
    let subscription = subscriptions::subscribe(
        state.repos.events.as_ref(),
        state.repos.subscriptions.as_ref(),
        event_id,
        identity.user_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// Remove a subscription
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither the subscriber nor the organizer
/// - `404 Not Found`: No such subscription
pub async fn unsubscribe(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    subscriptions::unsubscribe(state.repos.subscriptions.as_ref(), &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
