/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `events`: Event CRUD, listings and subscriber roster
/// - `subscriptions`: Subscribe and unsubscribe

pub mod auth;
pub mod events;
pub mod health;
pub mod subscriptions;
