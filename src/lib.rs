pub mod api_doc;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mount;
pub mod routes;
pub mod spanner;
pub mod state;

pub use client::{ApiClient, ClientError, CredentialError, CredentialProvider, StaticCredentials};
pub use config::{ClientConfig, Config};
pub use connection::{ConnectionProvider, SharedConnection};
pub use mount::build_router;
pub use routes::{RouteDescriptor, RouteMethod, RouteTable};
pub use spanner::{SpannerClient, SpannerConnector};
