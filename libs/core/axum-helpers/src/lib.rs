//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! - **[`server`]**: router assembly with OpenAPI UIs, health probes, graceful shutdown
//! - **[`middleware`]**: CORS and security headers
//! - **[`errors`]**: [`AppError`] and the standard [`ErrorResponse`] body
//! - **[`audit`]**: audit trail on the `audit` tracing target
//! - **[`docs`]**: OpenAPI additions for the JWT authentication endpoints
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes)?.merge(health_router(app_info!()));
//! create_production_app(router, &config.server, Duration::from_secs(30), async {}).await?;
//! ```

pub mod audit;
pub mod docs;
pub mod errors;
pub mod middleware;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};

pub use middleware::{cors_layer_from_env, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};

pub use docs::{JwtAuthDocs, augment as augment_with_jwt_docs};
