/// Subscription model and database operations
///
/// A subscription ties one participant to one event. The pair is unique at
/// the storage layer; that constraint is the authoritative guard against
/// duplicates, not the application-level pre-check.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subscriptions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT subscriptions_event_id_user_id_key UNIQUE (event_id, user_id)
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{StoreError, SubscriptionRepository};

/// Name of the unique constraint on `(event_id, user_id)`
pub const SUBSCRIPTION_UNIQUE_CONSTRAINT: &str = "subscriptions_event_id_user_id_key";

/// Name of the foreign key from `subscriptions.event_id`
pub const SUBSCRIPTION_EVENT_FK: &str = "subscriptions_event_id_fkey";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

/// Subscription joined with the organizer of its parent event
///
/// This is what removal authorization needs: both principals that may
/// delete the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionWithEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub subscription: Subscription,
    pub event_organizer_id: Uuid,
}

/// One row of an event's subscriber roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscription {
    /// Inserts a subscription
    ///
    /// # Errors
    ///
    /// - `StoreError::UniqueViolation` if the pair already exists
    /// - `StoreError::ForeignKeyViolation` if the event or user is gone
    pub async fn create(pool: &PgPool, data: CreateSubscription) -> Result<Self, StoreError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (event_id, user_id)
            VALUES ($1, $2)
            RETURNING id, event_id, user_id, created_at
            "#,
        )
        .bind(data.event_id)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(subscription)
    }

    pub async fn find_by_event_and_user(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, StoreError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, event_id, user_id, created_at
            FROM subscriptions
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(subscription)
    }

    pub async fn find_with_event(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<SubscriptionWithEvent>, StoreError> {
        let subscription = sqlx::query_as::<_, SubscriptionWithEvent>(
            r#"
            SELECT s.id, s.event_id, s.user_id, s.created_at,
                   e.organizer_id AS event_organizer_id
            FROM subscriptions s
            JOIN events e ON e.id = s.event_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(subscription)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Roster for an event, newest subscription first
    pub async fn list_participants(
        pool: &PgPool,
        event_id: Uuid,
    ) -> Result<Vec<Participant>, StoreError> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT s.id AS subscription_id, u.id AS user_id, u.name AS user_name,
                   u.email AS user_email, s.created_at AS subscribed_at
            FROM subscriptions s
            JOIN users u ON u.id = s.user_id
            WHERE s.event_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(participants)
    }
}

/// Postgres-backed subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, StoreError> {
        Subscription::find_by_event_and_user(&self.pool, event_id, user_id).await
    }

    async fn create(&self, data: CreateSubscription) -> Result<Subscription, StoreError> {
        Subscription::create(&self.pool, data).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SubscriptionWithEvent>, StoreError> {
        Subscription::find_with_event(&self.pool, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Subscription::delete(&self.pool, id).await
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        Subscription::list_participants(&self.pool, event_id).await
    }
}
