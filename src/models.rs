use serde::{Deserialize, Serialize};

/// Acknowledgment returned by the liveness route
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TestResponse {
    pub success: bool,
}
