/// Database models for EventHub
///
/// Each model carries its own SQL as inherent methods taking a `PgPool`, plus
/// a `Pg*` repository struct that exposes those methods through the traits in
/// [`crate::repository`].
///
/// # Models
///
/// - `user`: accounts, roles and the credential store
/// - `event`: events owned by organizers
/// - `subscription`: participant subscriptions, unique per (event, user)

pub mod event;
pub mod subscription;
pub mod user;
