//! # EventHub Shared Library
//!
//! Domain types, storage and access-control logic used by the EventHub API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: database models and their Postgres repositories
//! - `repository`: storage traits and the `Repositories` bundle
//! - `memory`: in-process storage backend with the same constraints
//! - `auth`: passwords, session tokens, role gate, ownership checks
//! - `subscriptions`: subscribe/unsubscribe with the uniqueness guarantee
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod memory;
pub mod models;
pub mod repository;
pub mod subscriptions;

/// Current version of the EventHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
