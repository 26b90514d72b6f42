/// Storage contracts
///
/// The authorization and subscription logic only talks to these traits. The
/// Postgres implementations live next to each model; [`crate::memory`]
/// provides an in-process backend with the same constraints.
///
/// Implementations must enforce two invariants themselves:
///
/// - `users.email` is unique (`StoreError::UniqueViolation`)
/// - `(subscriptions.event_id, subscriptions.user_id)` is unique
///   (`StoreError::UniqueViolation`)

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    event::{CreateEvent, Event, EventListing, PgEventRepository, UpdateEvent},
    subscription::{
        CreateSubscription, Participant, PgSubscriptionRepository, Subscription,
        SubscriptionWithEvent,
    },
    user::{CreateUser, PgUserStore, User},
};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A referenced row does not exist
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, StoreError::ForeignKeyViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();

            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation { constraint };
            }
        }

        StoreError::Database(err)
    }
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with `UniqueViolation` on a duplicate email
    async fn insert(&self, data: CreateUser) -> Result<User, StoreError>;
}

/// Event persistence
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    async fn find_listing(&self, id: Uuid) -> Result<Option<EventListing>, StoreError>;

    async fn create(&self, data: CreateEvent) -> Result<Event, StoreError>;

    /// Returns `None` if the event no longer exists
    async fn update(&self, id: Uuid, data: UpdateEvent) -> Result<Option<Event>, StoreError>;

    /// Returns `false` if nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_all(&self) -> Result<Vec<EventListing>, StoreError>;

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<EventListing>, StoreError>;
}

/// Subscription persistence
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Fails with `UniqueViolation` when the pair exists and with
    /// `ForeignKeyViolation` when the event or user does not
    async fn create(&self, data: CreateSubscription) -> Result<Subscription, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SubscriptionWithEvent>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError>;
}

/// Handles to every repository, shared read-only across requests
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub events: Arc<dyn EventRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,

    /// Set for the Postgres backend, used by health checks
    pool: Option<PgPool>,
}

impl Repositories {
    /// Builds Postgres repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            events: Arc::new(PgEventRepository::new(pool.clone())),
            subscriptions: Arc::new(PgSubscriptionRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Builds repositories from arbitrary implementations
    pub fn from_parts(
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            users,
            events,
            subscriptions,
            pool: None,
        }
    }

    /// Checks storage connectivity
    ///
    /// Backends without a pool are always reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match &self.pool {
            Some(pool) => crate::db::pool::health_check(pool).await.map_err(StoreError::from),
            None => Ok(()),
        }
    }
}
