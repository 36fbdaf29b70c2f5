use crate::models::TestResponse;
use crate::routes;
use axum::Json;

/// GET /api/test handler - Liveness probe
///
/// Always answers `{"success": true}`. It never touches the database and does
/// not depend on the mounted route table.
#[utoipa::path(
    get,
    path = routes::TEST,
    responses(
        (status = 200, description = "Server is up", body = TestResponse)
    ),
    tag = "system"
)]
pub async fn test_handler() -> Json<TestResponse> {
    tracing::debug!("{} was called", routes::TEST);
    Json(TestResponse { success: true })
}
