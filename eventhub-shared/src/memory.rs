/// In-memory storage backend
///
/// Implements every repository trait over a single mutex-guarded table set.
/// It enforces the same constraints as the Postgres schema (unique email,
/// unique `(event_id, user_id)`, foreign keys, cascade on event delete) so
/// the authorization and subscription logic behave identically on top of it.
/// Used by the test suites and for running the API without a database.
///
/// # Example
///
/// ```
/// use eventhub_shared::memory::MemoryStore;
///
/// let repos = MemoryStore::new().into_repositories();
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    event::{CreateEvent, Event, EventListing, UpdateEvent},
    subscription::{
        CreateSubscription, Participant, Subscription, SubscriptionWithEvent,
        SUBSCRIPTION_EVENT_FK, SUBSCRIPTION_UNIQUE_CONSTRAINT,
    },
    user::{CreateUser, User, UserSummary, EMAIL_UNIQUE_CONSTRAINT},
};
use crate::repository::{
    EventRepository, Repositories, StoreError, SubscriptionRepository, UserStore,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    // Insertion order doubles as creation order
    events: Vec<Event>,
    subscriptions: Vec<Subscription>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn event(&self, id: Uuid) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    fn listing(&self, event: &Event) -> Option<EventListing> {
        let organizer = self.user(event.organizer_id)?;
        let subscription_count = self
            .subscriptions
            .iter()
            .filter(|s| s.event_id == event.id)
            .count() as i64;

        Some(EventListing {
            event: event.clone(),
            organizer: UserSummary::from(organizer),
            subscription_count,
        })
    }
}

/// Mutex-guarded in-process store
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps one shared store as all three repositories
    pub fn into_repositories(self) -> Repositories {
        Arc::new(self).repositories()
    }

    /// Exposes an already shared store as all three repositories, keeping
    /// the caller's handle for inspection
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories::from_parts(self.clone(), self.clone(), self.clone())
    }

    /// Number of stored subscriptions, across all events
    pub async fn subscription_count(&self) -> usize {
        self.tables.lock().await.subscriptions.len()
    }

    /// Number of stored events
    pub async fn event_count(&self) -> usize {
        self.tables.lock().await.events.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::UniqueViolation {
                constraint: EMAIL_UNIQUE_CONSTRAINT.to_string(),
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        Ok(user)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.tables.lock().await.event(id).cloned())
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<EventListing>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.event(id).and_then(|e| tables.listing(e)))
    }

    async fn create(&self, data: CreateEvent) -> Result<Event, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.user(data.organizer_id).is_none() {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "events_organizer_id_fkey".to_string(),
            });
        }

        let event = Event {
            id: Uuid::new_v4(),
            organizer_id: data.organizer_id,
            title: data.title,
            description: data.description,
            location: data.location,
            price: data.price,
            banner_url: data.banner_url,
            created_at: Utc::now(),
        };
        tables.events.push(event.clone());

        Ok(event)
    }

    async fn update(&self, id: Uuid, data: UpdateEvent) -> Result<Option<Event>, StoreError> {
        let mut tables = self.tables.lock().await;

        let Some(event) = tables.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        data.apply_to(event);

        Ok(Some(event.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;

        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        let deleted = tables.events.len() < before;

        if deleted {
            tables.subscriptions.retain(|s| s.event_id != id);
        }

        Ok(deleted)
    }

    async fn list_all(&self) -> Result<Vec<EventListing>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .events
            .iter()
            .rev()
            .filter_map(|e| tables.listing(e))
            .collect())
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<EventListing>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .events
            .iter()
            .rev()
            .filter(|e| e.organizer_id == organizer_id)
            .filter_map(|e| tables.listing(e))
            .collect())
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .subscriptions
            .iter()
            .find(|s| s.event_id == event_id && s.user_id == user_id)
            .cloned())
    }

    async fn create(&self, data: CreateSubscription) -> Result<Subscription, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.event(data.event_id).is_none() {
            return Err(StoreError::ForeignKeyViolation {
                constraint: SUBSCRIPTION_EVENT_FK.to_string(),
            });
        }
        if tables.user(data.user_id).is_none() {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "subscriptions_user_id_fkey".to_string(),
            });
        }
        if tables
            .subscriptions
            .iter()
            .any(|s| s.event_id == data.event_id && s.user_id == data.user_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: SUBSCRIPTION_UNIQUE_CONSTRAINT.to_string(),
            });
        }

        let subscription = Subscription {
            id: Uuid::new_v4(),
            event_id: data.event_id,
            user_id: data.user_id,
            created_at: Utc::now(),
        };
        tables.subscriptions.push(subscription.clone());

        Ok(subscription)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SubscriptionWithEvent>, StoreError> {
        let tables = self.tables.lock().await;

        let joined = tables
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| {
                tables.event(s.event_id).map(|e| SubscriptionWithEvent {
                    subscription: s.clone(),
                    event_organizer_id: e.organizer_id,
                })
            });

        Ok(joined)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;

        let before = tables.subscriptions.len();
        tables.subscriptions.retain(|s| s.id != id);

        Ok(tables.subscriptions.len() < before)
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.event_id == event_id)
            .filter_map(|s| {
                tables.user(s.user_id).map(|u| Participant {
                    subscription_id: s.id,
                    user_id: u.id,
                    user_name: u.name.clone(),
                    user_email: u.email.clone(),
                    subscribed_at: s.created_at,
                })
            })
            .collect())
    }
}
