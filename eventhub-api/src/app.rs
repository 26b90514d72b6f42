/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use eventhub_api::{app::{build_router, AppState}, config::Config, upload::CloudinaryUploader};
/// use eventhub_shared::repository::Repositories;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let uploader = Arc::new(CloudinaryUploader::new(&config.upload)?);
/// let state = AppState::new(Repositories::postgres(pool), uploader, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        auth::{require_auth, require_organizer, require_participant},
        security::SecurityHeadersLayer,
    },
    upload::ImageUploader,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use eventhub_shared::{auth::jwt::TokenKeys, repository::Repositories};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Multipart framing overhead allowed on top of the banner size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Everything
/// in it is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Storage handles
    pub repos: Repositories,

    /// Token signing keys, derived once from the configured secret
    pub tokens: Arc<TokenKeys>,

    /// Banner image host
    pub uploader: Arc<dyn ImageUploader>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Fails if the JWT secret is empty.
    pub fn new(
        repos: Repositories,
        uploader: Arc<dyn ImageUploader>,
        config: Config,
    ) -> anyhow::Result<Self> {
        let tokens = TokenKeys::new(&config.jwt.secret)?;

        Ok(Self {
            repos,
            tokens: Arc::new(tokens),
            uploader,
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                               public
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register                    public
///     │   └── POST /login                       public
///     ├── /events/
///     │   ├── GET    /                          public
///     │   ├── GET    /:id                       public
///     │   ├── POST   /                          organizer
///     │   ├── GET    /myevents                  organizer
///     │   ├── PUT    /:id                       organizer, owner
///     │   ├── DELETE /:id                       organizer, owner
///     │   ├── GET    /:id/subscriptions         organizer, owner
///     │   └── POST   /:id/subscribe             participant
///     └── DELETE /subscriptions/:id             subscriber or organizer
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. CORS
/// 3. Logging (tower-http TraceLayer)
/// 4. Body limit
/// 5. Authentication, then role gate (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let public_event_routes = Router::new()
        .route("/", get(routes::events::list_events))
        .route("/:id", get(routes::events::get_event));

    // Route layers run in reverse order of addition: auth, then role
    let organizer_routes = Router::new()
        .route("/", post(routes::events::create_event))
        .route("/myevents", get(routes::events::my_events))
        .route(
            "/:id",
            put(routes::events::update_event).delete(routes::events::delete_event),
        )
        .route("/:id/subscriptions", get(routes::events::list_subscribers))
        .route_layer(from_fn(require_organizer))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let participant_routes = Router::new()
        .route("/:id/subscribe", post(routes::subscriptions::subscribe))
        .route_layer(from_fn(require_participant))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let subscription_routes = Router::new()
        .route("/:id", delete(routes::subscriptions::unsubscribe))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let event_routes = Router::new()
        .merge(public_event_routes)
        .merge(organizer_routes)
        .merge(participant_routes);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/events", event_routes)
        .nest("/subscriptions", subscription_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    let body_limit = state.config.upload.max_bytes + MULTIPART_OVERHEAD_BYTES;
    let enable_hsts = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(enable_hsts))
        .with_state(state)
}
