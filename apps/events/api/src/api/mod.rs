use axum::Router;
use domain_events::ImageStoreConfig;
use tower_http::services::ServeDir;

pub mod events;
pub mod health;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
///
/// Returns a stateless Router (all sub-routers have state already applied).
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new().nest("/event", events::router(state))
}

/// Creates a router with the /ready endpoint that performs actual health checks.
///
/// This router has state applied and can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

/// Serves stored images at their public paths (`/uploads/{name}`).
pub fn uploads_router(config: &ImageStoreConfig) -> Router {
    if config.public_prefix.is_empty() {
        tracing::warn!("UPLOAD_PUBLIC_PATH is '/', uploaded images are not served");
        return Router::new();
    }

    Router::new().nest_service(&config.public_prefix, ServeDir::new(&config.root))
}
