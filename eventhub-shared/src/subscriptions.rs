/// Subscription lifecycle: Nonexistent -> Active -> Deleted
///
/// `subscribe` runs a friendly check-then-insert, but the storage unique
/// constraint on `(event_id, user_id)` is what actually guarantees at most
/// one subscription per pair. When two requests race past the pre-check, the
/// loser's unique violation comes back as the same [`SubscriptionError::AlreadySubscribed`]
/// the pre-check would have produced.
///
/// # Example
///
/// ```
/// use eventhub_shared::memory::MemoryStore;
/// use eventhub_shared::subscriptions::{subscribe, SubscriptionError};
/// use uuid::Uuid;
///
/// # async fn example() {
/// let repos = MemoryStore::new().into_repositories();
/// let result = subscribe(
///     repos.events.as_ref(),
///     repos.subscriptions.as_ref(),
///     Uuid::new_v4(),
///     Uuid::new_v4(),
/// )
/// .await;
/// assert!(matches!(result, Err(SubscriptionError::EventNotFound)));
/// # }
/// ```

use uuid::Uuid;

use crate::auth::{
    authorization::{authorize_subscription_removal, AuthzError},
    middleware::Identity,
};
use crate::models::subscription::{CreateSubscription, Subscription};
use crate::repository::{EventRepository, StoreError, SubscriptionRepository};

/// Error type for subscribing
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Event not found")]
    EventNotFound,

    #[error("Already subscribed to this event")]
    AlreadySubscribed,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Subscribes `user_id` to `event_id`
///
/// 1. The event must exist, else `EventNotFound`
/// 2. An existing pair is `AlreadySubscribed`
/// 3. Insert; a unique violation is `AlreadySubscribed`, a foreign key
///    violation (event deleted meanwhile) is `EventNotFound`
pub async fn subscribe(
    events: &dyn EventRepository,
    subscriptions: &dyn SubscriptionRepository,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<Subscription, SubscriptionError> {
    if events.find_by_id(event_id).await?.is_none() {
        return Err(SubscriptionError::EventNotFound);
    }

    if subscriptions
        .find_by_event_and_user(event_id, user_id)
        .await?
        .is_some()
    {
        return Err(SubscriptionError::AlreadySubscribed);
    }

    match subscriptions
        .create(CreateSubscription { event_id, user_id })
        .await
    {
        Ok(subscription) => {
            tracing::info!(
                subscription_id = %subscription.id,
                event_id = %event_id,
                user_id = %user_id,
                "Subscription created"
            );
            Ok(subscription)
        }
        Err(e) if e.is_unique_violation() => {
            tracing::warn!(
                event_id = %event_id,
                user_id = %user_id,
                "Concurrent duplicate subscription rejected by storage"
            );
            Err(SubscriptionError::AlreadySubscribed)
        }
        Err(e) if e.is_foreign_key_violation() => Err(SubscriptionError::EventNotFound),
        Err(e) => Err(e.into()),
    }
}

/// Deletes a subscription on behalf of its subscriber or the event organizer
///
/// A row that vanishes between the check and the delete is `NotFound`, so a
/// second removal of the same id never reports success.
pub async fn unsubscribe(
    subscriptions: &dyn SubscriptionRepository,
    identity: &Identity,
    subscription_id: Uuid,
) -> Result<(), AuthzError> {
    authorize_subscription_removal(subscriptions, identity, subscription_id).await?;

    if !subscriptions.delete(subscription_id).await? {
        return Err(AuthzError::NotFound("Subscription"));
    }

    tracing::info!(
        subscription_id = %subscription_id,
        user_id = %identity.user_id,
        "Subscription deleted"
    );
    Ok(())
}
