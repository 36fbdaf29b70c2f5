// Route mounting: descriptors behind the connection middleware, plus built-in routes

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::config::Config;
use crate::connection::ConnectionProvider;
use crate::error::ApiError;
use crate::handlers;
use crate::routes::{self, RouteTable};
use crate::state::AppState;

/// Build the application router
///
/// Nothing is connected here; the provider is first asked for a connection
/// when a mounted route receives a request.
pub fn build_router<P: ConnectionProvider>(
    config: &Config,
    table: RouteTable,
    provider: Arc<P>,
) -> Result<Router> {
    let cors = cors_layer(&config.client_origin)?;

    let mut router = Router::new();
    for route in table {
        let path = route.full_path();
        tracing::info!("Mounting route: {} {}", route.method, path);

        let handler = route.handler.route_layer(middleware::from_fn_with_state(
            provider.clone(),
            ensure_connection::<P>,
        ));
        router = router.route(&path, handler);
    }

    let state = AppState { probe: provider };

    Ok(router
        .route(routes::TEST, get(handlers::test_handler))
        .route(routes::HEALTH, get(handlers::health_handler).with_state(state))
        .merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Acquire a connection, then hand the untouched request to the route handler
///
/// The connection is stored in the request extensions, so handlers can take it
/// with `Extension<P::Connection>`.
async fn ensure_connection<P: ConnectionProvider>(
    State(provider): State<Arc<P>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let connection = match provider.connect().await {
        Ok(connection) => connection,
        Err(err) => {
            tracing::error!(
                "Database connection failed for {} {}: {:#}",
                request.method(),
                request.uri(),
                err
            );
            return Err(ApiError::DatabaseConnection(err));
        }
    };

    request.extensions_mut().insert(connection);
    Ok(next.run(request).await)
}

/// CORS with a single allowed origin
///
/// Allowed methods and mirrored request headers follow the usual CORS
/// middleware defaults.
fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("Invalid CORS origin: '{}'", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request()))
}
