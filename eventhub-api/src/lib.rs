//! # EventHub API Server Library
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication, role gates and security headers
//! - `routes`: API route handlers
//! - `upload`: Banner image uploads

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod upload;
