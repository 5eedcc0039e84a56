use axum::Router;
use domain_events::{EventService, LocalImageStore, PgEventRepository, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgEventRepository::new(state.db.clone());
    let images = LocalImageStore::new(state.config.uploads.clone());
    let service = EventService::new(repository, images);
    handlers::router(service, state.config.uploads.max_body_bytes)
}
