/// Event endpoints
///
/// # Endpoints
///
/// - `GET /v1/events` - All events, newest first (public)
/// - `GET /v1/events/:id` - One event (public)
/// - `POST /v1/events` - Create, multipart with a required `banner` (organizer)
/// - `GET /v1/events/myevents` - The caller's events (organizer)
/// - `PUT /v1/events/:id` - Partial update, multipart (owner)
/// - `DELETE /v1/events/:id` - Delete with its subscriptions (owner)
/// - `GET /v1/events/:id/subscriptions` - Subscriber roster (owner)
///
/// # Multipart fields
///
/// `title`, `description`, `location`, `price` (text) and `banner` (an
/// `image/*` file). Unknown fields are ignored.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::PathRejection, Multipart, Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use bytes::Bytes;
use eventhub_shared::{
    auth::{authorization::authorize_event_change, middleware::Identity},
    models::{
        event::{CreateEvent, Event, EventListing, UpdateEvent},
        subscription::Participant,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Banner file as received
#[derive(Debug, Clone)]
pub struct BannerFile {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Text fields of an event form; `None` means the field was not sent
#[derive(Debug, Default, Validate)]
pub struct EventForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Location must be 1-255 characters"))]
    pub location: Option<String>,

    /// Raw text, parsed by [`parse_price`]
    pub price: Option<String>,

    pub banner: Option<BannerFile>,
}

/// Reads every field of a multipart event form
pub async fn read_event_form(mut multipart: Multipart) -> ApiResult<EventForm> {
    let mut form = EventForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "banner" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                form.banner = Some(BannerFile {
                    bytes,
                    content_type,
                });
            }
            "title" => form.title = Some(field.text().await?.trim().to_string()),
            "description" => form.description = Some(field.text().await?.trim().to_string()),
            "location" => form.location = Some(field.text().await?.trim().to_string()),
            "price" => form.price = Some(field.text().await?.trim().to_string()),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Parses a price; it must be a finite number no less than zero
pub fn parse_price(raw: &str) -> Result<f64, ValidationErrorDetail> {
    let price: f64 = raw
        .parse()
        .map_err(|_| ValidationErrorDetail::new("price", "Price must be a number"))?;

    if !price.is_finite() || price < 0.0 {
        return Err(ValidationErrorDetail::new(
            "price",
            "Price must be a non-negative number",
        ));
    }

    Ok(price)
}

fn check_banner(banner: &BannerFile, max_bytes: usize) -> Option<ValidationErrorDetail> {
    if !banner.content_type.starts_with("image/") {
        return Some(ValidationErrorDetail::new("banner", "Only images are allowed"));
    }
    if banner.bytes.is_empty() {
        return Some(ValidationErrorDetail::new("banner", "Banner is empty"));
    }
    if banner.bytes.len() > max_bytes {
        return Some(ValidationErrorDetail::new(
            "banner",
            format!("Banner must be at most {} bytes", max_bytes),
        ));
    }
    None
}

/// Validated contents of a create form
#[derive(Debug)]
pub struct CheckedCreate {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: Option<f64>,
    pub banner: BannerFile,
}

/// Validated contents of an update form; `None` leaves a field unchanged
#[derive(Debug)]
pub struct CheckedUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub banner: Option<BannerFile>,
}

impl EventForm {
    /// Validates a create form: every field but `price` is required
    pub fn check_create(self, max_banner_bytes: usize) -> ApiResult<CheckedCreate> {
        let (mut details, price) = self.violations(true, max_banner_bytes);

        for (field, present) in [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("location", self.location.is_some()),
            ("banner", self.banner.is_some()),
        ] {
            if !present {
                details.push(ValidationErrorDetail::new(
                    field,
                    format!("{} is required", field),
                ));
            }
        }

        match (self.title, self.description, self.location, self.banner) {
            (Some(title), Some(description), Some(location), Some(banner)) if details.is_empty() => {
                Ok(CheckedCreate {
                    title,
                    description,
                    location,
                    price,
                    banner,
                })
            }
            _ => Err(ApiError::ValidationError(details)),
        }
    }

    /// Validates an update form; absent fields are left alone
    pub fn check_update(self, max_banner_bytes: usize) -> ApiResult<CheckedUpdate> {
        let (details, price) = self.violations(false, max_banner_bytes);

        if !details.is_empty() {
            return Err(ApiError::ValidationError(details));
        }

        Ok(CheckedUpdate {
            title: self.title,
            description: self.description,
            location: self.location,
            price,
            banner: self.banner,
        })
    }

    /// Violations among the fields that were sent, plus the parsed price
    fn violations(&self, creating: bool, max_banner_bytes: usize) -> (Vec<ValidationErrorDetail>, Option<f64>) {
        let mut details = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation_details(&errors),
        };

        // An empty price on create means "free"; on update it is a mistake
        let price = match self.price.as_deref() {
            None => None,
            Some("") if creating => None,
            Some(raw) => match parse_price(raw) {
                Ok(price) => Some(price),
                Err(detail) => {
                    details.push(detail);
                    None
                }
            },
        };

        if let Some(detail) = self
            .banner
            .as_ref()
            .and_then(|banner| check_banner(banner, max_banner_bytes))
        {
            details.push(detail);
        }

        (details, price)
    }
}

/// List all events with organizer and subscription count
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<EventListing>>> {
    let events = state.repos.events.list_all().await?;
    Ok(Json(events))
}

/// Event detail
///
/// # Errors
///
/// - `404 Not Found`: No such event
pub async fn get_event(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<EventListing>> {
    let Path(id) = path?;

    let event = state
        .repos
        .events
        .find_listing(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(event))
}

/// Events organized by the caller
pub async fn my_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<EventListing>>> {
    let events = state.repos.events.list_by_organizer(identity.user_id).await?;
    Ok(Json(events))
}

/// Create an event
///
/// The banner is uploaded first; the event row is only written once the
/// image host returned a URL.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid fields, or not a multipart body
/// - `502 Bad Gateway`: Banner upload failed
pub async fn create_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let CheckedCreate {
        title,
        description,
        location,
        price,
        banner,
    } = read_event_form(multipart?)
        .await?
        .check_create(state.config.upload.max_bytes)?;

    let banner_url = state
        .uploader
        .upload(banner.bytes, &banner.content_type)
        .await?;

    let event = state
        .repos
        .events
        .create(CreateEvent {
            organizer_id: identity.user_id,
            title,
            description,
            location,
            price,
            banner_url,
        })
        .await?;

    tracing::info!(event_id = %event.id, organizer_id = %identity.user_id, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

/// Partially update an event
///
/// Ownership is checked before the body is looked at, so a non-owner gets
/// `403` whatever they send. Fields not sent are left unchanged; a new
/// banner replaces the old URL.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid fields, or not a multipart body
/// - `403 Forbidden`: Caller does not own the event
/// - `404 Not Found`: No such event
pub async fn update_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Event>> {
    let Path(id) = path?;
    authorize_event_change(state.repos.events.as_ref(), &identity, id).await?;

    let form = read_event_form(multipart?)
        .await?
        .check_update(state.config.upload.max_bytes)?;

    let banner_url = match form.banner {
        Some(banner) => Some(
            state
                .uploader
                .upload(banner.bytes, &banner.content_type)
                .await?,
        ),
        None => None,
    };

    let event = state
        .repos
        .events
        .update(
            id,
            UpdateEvent {
                title: form.title,
                description: form.description,
                location: form.location,
                price: form.price,
                banner_url,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    tracing::info!(event_id = %id, "Event updated");
    Ok(Json(event))
}

/// Delete an event and its subscriptions
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    authorize_event_change(state.repos.events.as_ref(), &identity, id).await?;

    if !state.repos.events.delete(id).await? {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    tracing::info!(event_id = %id, organizer_id = %identity.user_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Subscriber roster, newest subscription first
pub async fn list_subscribers(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Participant>>> {
    let Path(id) = path?;
    authorize_event_change(state.repos.events.as_ref(), &identity, id).await?;

    let participants = state.repos.subscriptions.list_by_event(id).await?;
    Ok(Json(participants))
}
