/// Event model and database operations
///
/// Events belong to the organizer that created them. Ownership is the
/// `organizer_id` column and nothing else; authorization re-reads it from
/// storage on every mutation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     organizer_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL,
///     location VARCHAR(255) NOT NULL,
///     price DOUBLE PRECISION CHECK (price IS NULL OR price >= 0),
///     banner_url VARCHAR(1024) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;
use crate::repository::{EventRepository, StoreError};

/// Stored event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: Option<f64>,
    pub banner_url: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: Option<f64>,
    pub banner_url: String,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub banner_url: Option<String>,
}

impl UpdateEvent {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.price.is_none()
            && self.banner_url.is_none()
    }

    /// Applies the present fields onto `event`
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(price) = self.price {
            event.price = Some(price);
        }
        if let Some(banner_url) = &self.banner_url {
            event.banner_url = banner_url.clone();
        }
    }
}

/// Event joined with its organizer and subscription count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListing {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: UserSummary,
    pub subscription_count: i64,
}

#[derive(sqlx::FromRow)]
struct EventListingRow {
    #[sqlx(flatten)]
    event: Event,
    organizer_name: String,
    organizer_email: String,
    subscription_count: i64,
}

impl From<EventListingRow> for EventListing {
    fn from(row: EventListingRow) -> Self {
        let organizer = UserSummary {
            id: row.event.organizer_id,
            name: row.organizer_name,
            email: row.organizer_email,
        };

        Self {
            event: row.event,
            organizer,
            subscription_count: row.subscription_count,
        }
    }
}

const LISTING_SELECT: &str = r#"
    SELECT e.id, e.organizer_id, e.title, e.description, e.location, e.price,
           e.banner_url, e.created_at,
           u.name AS organizer_name, u.email AS organizer_email,
           (SELECT COUNT(*) FROM subscriptions s WHERE s.event_id = e.id) AS subscription_count
    FROM events e
    JOIN users u ON u.id = e.organizer_id
"#;

impl Event {
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (organizer_id, title, description, location, price, banner_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, organizer_id, title, description, location, price, banner_url, created_at
            "#,
        )
        .bind(data.organizer_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.location)
        .bind(data.price)
        .bind(data.banner_url)
        .fetch_one(pool)
        .await?;

        Ok(event)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, organizer_id, title, description, location, price, banner_url, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(event)
    }

    /// Updates the present fields, returning `None` if the event is gone
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateEvent,
    ) -> Result<Option<Self>, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                price = COALESCE($5, price),
                banner_url = COALESCE($6, banner_url)
            WHERE id = $1
            RETURNING id, organizer_id, title, description, location, price, banner_url, created_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.location)
        .bind(data.price)
        .bind(data.banner_url)
        .fetch_optional(pool)
        .await?;

        Ok(event)
    }

    /// Deletes an event and, by cascade, its subscriptions
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_listing(pool: &PgPool, id: Uuid) -> Result<Option<EventListing>, StoreError> {
        let query = format!("{LISTING_SELECT} WHERE e.id = $1");
        let row = sqlx::query_as::<_, EventListingRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(EventListing::from))
    }

    /// All events, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<EventListing>, StoreError> {
        let query = format!("{LISTING_SELECT} ORDER BY e.created_at DESC");
        let rows = sqlx::query_as::<_, EventListingRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(EventListing::from).collect())
    }

    /// Events owned by `organizer_id`, newest first
    pub async fn list_by_organizer(
        pool: &PgPool,
        organizer_id: Uuid,
    ) -> Result<Vec<EventListing>, StoreError> {
        let query = format!("{LISTING_SELECT} WHERE e.organizer_id = $1 ORDER BY e.created_at DESC");
        let rows = sqlx::query_as::<_, EventListingRow>(&query)
            .bind(organizer_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(EventListing::from).collect())
    }
}

/// Postgres-backed event repository
#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Event::find_by_id(&self.pool, id).await
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<EventListing>, StoreError> {
        Event::find_listing(&self.pool, id).await
    }

    async fn create(&self, data: CreateEvent) -> Result<Event, StoreError> {
        Event::create(&self.pool, data).await
    }

    async fn update(&self, id: Uuid, data: UpdateEvent) -> Result<Option<Event>, StoreError> {
        Event::update(&self.pool, id, data).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Event::delete(&self.pool, id).await
    }

    async fn list_all(&self) -> Result<Vec<EventListing>, StoreError> {
        Event::list_all(&self.pool).await
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<EventListing>, StoreError> {
        Event::list_by_organizer(&self.pool, organizer_id).await
    }
}
