use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::AppError;
use thiserror::Error;

use crate::models::{StatusResponse, ValidationReason};
use crate::storage::ImageStoreError;

pub const MISSING_DATA: &str = "Missing data";
pub const INVALID_IMAGE_DATA: &str = "Invalid image data";

#[derive(Debug, Error)]
pub enum EventError {
    /// Rejected input; `fields` lists the offending field paths
    #[error("Missing data ({reason:?}): {fields:?}")]
    Validation {
        reason: ValidationReason,
        fields: Vec<String>,
    },

    /// Request body over the route's limit of `limit` bytes
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    ImageStore(#[from] ImageStoreError),

    #[error("Failed to persist event: {0}")]
    Persistence(String),

    #[error("Failed to read events: {0}")]
    Repository(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl EventError {
    pub fn missing(fields: Vec<String>) -> Self {
        EventError::Validation {
            reason: ValidationReason::Missing,
            fields,
        }
    }

    pub fn invalid(fields: Vec<String>) -> Self {
        EventError::Validation {
            reason: ValidationReason::Invalid,
            fields,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EventError::Validation { .. }
                | EventError::PayloadTooLarge { .. }
                | EventError::ImageStore(ImageStoreError::Decode(_))
        )
    }
}

/// Convert EventError to AppError for standardized error responses
impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Validation { .. } => AppError::BadRequest(MISSING_DATA.to_string()),
            EventError::PayloadTooLarge { limit } => AppError::PayloadTooLarge { limit },
            EventError::ImageStore(ImageStoreError::Decode(_)) => {
                AppError::BadRequest(INVALID_IMAGE_DATA.to_string())
            }
            EventError::ImageStore(ImageStoreError::Write(io)) => AppError::Io(io),
            EventError::ImageStore(err @ ImageStoreError::InvalidPath(_)) => {
                AppError::Storage(err.to_string())
            }
            EventError::Persistence(msg) | EventError::Repository(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        match self {
            EventError::Validation { reason, fields } => (
                StatusCode::BAD_REQUEST,
                Json(StatusResponse::error(MISSING_DATA, Some(fields)).with_reason(reason)),
            )
                .into_response(),
            EventError::ImageStore(ImageStoreError::Decode(details)) => {
                tracing::warn!(details = %details, "Rejected undecodable image payload");
                (
                    StatusCode::BAD_REQUEST,
                    Json(StatusResponse::error(INVALID_IMAGE_DATA, None)),
                )
                    .into_response()
            }
            other => {
                let app_error: AppError = other.into();
                app_error.into_response()
            }
        }
    }
}
