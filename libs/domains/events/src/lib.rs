//! Events Domain
//!
//! Event ingestion with inline base64 images, and the event listing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← POST /new, GET /all
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌──────────────┐
//! │   Service   │ ───► │  ImageStore  │  ← decode + write image files
//! └──────┬──────┘      └──────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← aggregate commit / listing (in-memory, Postgres)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← requests, aggregate, views
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_events::{
//!     handlers,
//!     repository::InMemoryEventRepository,
//!     service::EventService,
//!     storage::{ImageStoreConfig, LocalImageStore},
//! };
//!
//! let config = ImageStoreConfig::default();
//! let max_body_bytes = config.max_body_bytes;
//! let repository = InMemoryEventRepository::new();
//! let images = LocalImageStore::new(config);
//! let service = EventService::new(repository, images);
//!
//! // Mount under `/api/event`
//! let router = handlers::router(service, max_body_bytes);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod storage;

pub use error::{EventError, EventResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateEvent, Event, EventImage, EventImageView, EventView, ImageUpload, NewEvent,
    NewEventImage, StatusResponse, ValidationReason,
};
pub use postgres::PgEventRepository;
pub use repository::{EventRepository, InMemoryEventRepository};
pub use service::EventService;
pub use storage::{ImageStore, ImageStoreConfig, ImageStoreError, LocalImageStore};
