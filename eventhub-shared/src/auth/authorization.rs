/// Role gate and ownership authorization
///
/// Two layers of checks, both fed an explicit [`Identity`]:
///
/// 1. **Role gate**: does the caller hold the role a route requires?
/// 2. **Ownership**: does the stored foreign key (`organizer_id`, `user_id`)
///    tie the caller to the resource?
///
/// Ownership checks always re-read the resource from storage inside the same
/// operation. A missing resource is reported as `NotFound` before any
/// permission decision is made.
///
/// # Example
///
/// ```no_run
/// use eventhub_shared::auth::authorization::{authorize_event_change, require_role};
/// use eventhub_shared::auth::middleware::Identity;
/// use eventhub_shared::models::user::Role;
/// use eventhub_shared::repository::EventRepository;
/// use uuid::Uuid;
///
/// # async fn example(
/// #     events: &dyn EventRepository,
/// #     identity: Option<Identity>,
/// #     event_id: Uuid,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let organizer = require_role(identity.as_ref(), Role::Organizer)?;
/// let event = authorize_event_change(events, &organizer, event_id).await?;
/// # Ok(())
/// # }
/// ```

use super::middleware::Identity;
use crate::models::{event::Event, subscription::SubscriptionWithEvent, user::Role};
use crate::repository::{EventRepository, StoreError, SubscriptionRepository};
use uuid::Uuid;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// No identity was verified upstream
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but with the wrong role
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    WrongRole { required: Role, actual: Role },

    /// The referenced resource does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The resource exists but is not tied to the caller
    #[error("Not authorized to modify this {0}")]
    NotOwner(&'static str),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Requires any verified identity
pub fn require_identity(identity: Option<&Identity>) -> Result<Identity, AuthzError> {
    identity.copied().ok_or(AuthzError::Unauthenticated)
}

/// Requires a verified identity holding `expected`
///
/// `Unauthenticated` and `WrongRole` are distinct so the boundary can answer
/// 401 and 403 respectively.
pub fn require_role(identity: Option<&Identity>, expected: Role) -> Result<Identity, AuthzError> {
    let identity = require_identity(identity)?;

    if identity.role != expected {
        return Err(AuthzError::WrongRole {
            required: expected,
            actual: identity.role,
        });
    }

    Ok(identity)
}

/// True iff the caller organizes `event`
pub fn can_modify_event(identity: &Identity, event: &Event) -> bool {
    event.organizer_id == identity.user_id
}

/// True iff the caller is the subscriber or the parent event's organizer
pub fn can_delete_subscription(identity: &Identity, subscription: &SubscriptionWithEvent) -> bool {
    identity.user_id == subscription.subscription.user_id
        || identity.user_id == subscription.event_organizer_id
}

/// Loads `event_id` fresh from storage and checks the caller owns it
///
/// Gates event update and delete and the subscriber roster.
pub async fn authorize_event_change(
    events: &dyn EventRepository,
    identity: &Identity,
    event_id: Uuid,
) -> Result<Event, AuthzError> {
    let event = events
        .find_by_id(event_id)
        .await?
        .ok_or(AuthzError::NotFound("Event"))?;

    if !can_modify_event(identity, &event) {
        tracing::info!(
            user_id = %identity.user_id,
            event_id = %event_id,
            "Event change denied: not the organizer"
        );
        return Err(AuthzError::NotOwner("event"));
    }

    Ok(event)
}

/// Loads `subscription_id` with its event and checks either principal
pub async fn authorize_subscription_removal(
    subscriptions: &dyn SubscriptionRepository,
    identity: &Identity,
    subscription_id: Uuid,
) -> Result<SubscriptionWithEvent, AuthzError> {
    let subscription = subscriptions
        .find_by_id(subscription_id)
        .await?
        .ok_or(AuthzError::NotFound("Subscription"))?;

    if !can_delete_subscription(identity, &subscription) {
        tracing::info!(
            user_id = %identity.user_id,
            subscription_id = %subscription_id,
            "Subscription removal denied"
        );
        return Err(AuthzError::NotOwner("subscription"));
    }

    Ok(subscription)
}
