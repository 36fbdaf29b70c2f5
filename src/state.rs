use crate::connection::HealthProbe;
use std::sync::Arc;

/// State shared by the built-in routes
#[derive(Clone)]
pub struct AppState {
    pub probe: Arc<dyn HealthProbe>,
}
