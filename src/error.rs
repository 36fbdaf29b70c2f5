use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Errors raised by the mounting layer itself
///
/// Failures inside mounted handlers are the handlers' own business; this type
/// only covers what happens before a handler is reached.
#[derive(Debug)]
pub enum ApiError {
    /// The connection provider could not establish a database connection
    DatabaseConnection(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::DatabaseConnection(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database connection failed: {:#}", err),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[tokio::test]
    async fn test_database_connection_error_renders_context_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("connection refused"))
            .context("Failed to create Spanner client")
            .unwrap_err();

        let response = ApiError::DatabaseConnection(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body.error,
            "Database connection failed: Failed to create Spanner client: connection refused"
        );
    }
}
