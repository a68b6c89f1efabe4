use utoipa::OpenApi;

use super::handlers::{health, verification};

#[derive(OpenApi)]
#[openapi(
    paths(health::health, verification::resend_verification),
    components(schemas(health::Health, verification::ResendForm)),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Email verification actions")
    )
)]
struct ApiDoc;

/// OpenAPI document for the JSON and form endpoints.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
