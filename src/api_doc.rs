use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::TestResponse;

/// OpenAPI documentation for the built-in routes
///
/// Mounted route tables are supplied at runtime and are not described here.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "fullstack-api",
        version = "0.1.0",
        description = "Mounts application routes under /api with CORS and a lazily connected database"
    ),
    paths(
        handlers::liveness::test_handler,
        handlers::health::health_handler
    ),
    components(
        schemas(
            TestResponse,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "system", description = "Liveness and health checks")
    )
)]
pub struct ApiDoc;
