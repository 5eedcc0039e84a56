use axum_helpers::JwtAuthDocs;
use utoipa::OpenApi;

static JWT_DOCS: JwtAuthDocs = JwtAuthDocs::DEFAULT;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Events API",
        version = "0.1.0",
        description = "Event creation with inline base64 images, and event listing"
    ),
    nest(
        (path = "/api/event", api = domain_events::ApiDoc)
    ),
    modifiers(&JWT_DOCS)
)]
pub struct ApiDoc;
