use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, ErrorResponse, errors::responses::InternalServerErrorResponse,
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{EventError, EventResult};
use crate::models::{
    CreateEvent, EventImageView, EventView, ImageUpload, StatusResponse, ValidationReason,
};
use crate::repository::EventRepository;
use crate::service::EventService;
use crate::storage::ImageStore;

pub const TAG: &str = "Events";

/// OpenAPI documentation for Events API
#[derive(OpenApi)]
#[openapi(
    paths(create_event, list_events),
    components(
        schemas(
            CreateEvent,
            ImageUpload,
            EventView,
            EventImageView,
            StatusResponse,
            ValidationReason,
            ErrorResponse
        ),
        responses(InternalServerErrorResponse)
    ),
    tags(
        (name = TAG, description = "Event creation with inline images, and listing")
    )
)]
pub struct ApiDoc;

struct EventsState<R: EventRepository, S: ImageStore> {
    service: EventService<R, S>,
    max_body_bytes: usize,
}

/// Create the event router; mount it under `/event`
///
/// Request bodies larger than `max_body_bytes` are answered with 413.
pub fn router<R, S>(service: EventService<R, S>, max_body_bytes: usize) -> Router
where
    R: EventRepository + 'static,
    S: ImageStore + 'static,
{
    let shared_state = Arc::new(EventsState {
        service,
        max_body_bytes,
    });

    Router::new()
        .route("/new", post(create_event))
        .route("/all", get(list_events))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(shared_state)
}

/// Create an event, storing any embedded images
#[utoipa::path(
    post,
    path = "/new",
    tag = TAG,
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = StatusResponse,
            example = json!({"status": "success", "message": "Event created", "id": "0192f0c1-a2b3-7c4d-8e9f-a0b1c2d3e4f5"})),
        (status = 400, description = "Missing or invalid data, or undecodable image", body = StatusResponse,
            example = json!({"status": "error", "message": "Missing data", "fields": ["title"], "reason": "missing"})),
        (status = 413, description = "Request body over the configured limit", body = ErrorResponse,
            example = json!({"code": 1014, "error": "PAYLOAD_TOO_LARGE", "message": "Request body is too large", "details": {"max_body_bytes": 26214400}})),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_event<R: EventRepository, S: ImageStore>(
    State(state): State<Arc<EventsState<R, S>>>,
    headers: HeaderMap,
    payload: Result<Json<CreateEvent>, JsonRejection>,
) -> EventResult<impl IntoResponse> {
    // Oversized bodies get 413; other unreadable bodies count as missing data
    let Json(input) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!(limit = state.max_body_bytes, "Rejected oversized event body");
            return EventError::PayloadTooLarge {
                limit: state.max_body_bytes,
            };
        }
        tracing::debug!(error = %rejection, "Rejected event body");
        EventError::missing(Vec::new())
    })?;

    let title = input.title.clone().unwrap_or_default();
    let image_count = input.images.len();

    let id = state.service.create_event(input).await?;

    AuditEvent::new(
        None,
        "event.create",
        Some(format!("event:{}", id)),
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({
        "title": title,
        "image_count": image_count,
    }))
    .log();

    Ok((StatusCode::CREATED, Json(StatusResponse::created(id))))
}

/// List all events with their images
#[utoipa::path(
    get,
    path = "/all",
    tag = TAG,
    responses(
        (status = 200, description = "All events, oldest first", body = Vec<EventView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_events<R: EventRepository, S: ImageStore>(
    State(state): State<Arc<EventsState<R, S>>>,
) -> EventResult<Json<Vec<EventView>>> {
    let events = state.service.list_events().await?;
    Ok(Json(events))
}
