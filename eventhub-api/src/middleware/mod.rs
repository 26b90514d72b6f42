/// Middleware modules for the API server
///
/// - `auth`: bearer token verification and role gates
/// - `security`: security response headers

pub mod auth;
pub mod security;
