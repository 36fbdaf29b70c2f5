use std::env;
use anyhow::{Context, Result};

pub const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Server configuration, read from the process environment
#[derive(Debug, Clone)]
pub struct Config {
    pub spanner_emulator_host: Option<String>,
    pub spanner_project: String,
    pub spanner_instance: String,
    pub spanner_database: String,
    pub service_port: u16,
    pub service_host: String,
    /// Origin allowed by CORS (`client` variable)
    pub client_origin: String,
    /// Maximum accepted request body, in bytes
    pub body_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let spanner_emulator_host = env::var("SPANNER_EMULATOR_HOST").ok();

        let spanner_project = env::var("SPANNER_PROJECT")
            .context("SPANNER_PROJECT environment variable is required")?;

        let spanner_instance = env::var("SPANNER_INSTANCE")
            .context("SPANNER_INSTANCE environment variable is required")?;

        let spanner_database = env::var("SPANNER_DATABASE")
            .context("SPANNER_DATABASE environment variable is required")?;

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let client_origin = env::var("client")
            .unwrap_or_else(|_| DEFAULT_CLIENT_ORIGIN.to_string());

        let body_limit = match env::var("BODY_LIMIT") {
            Ok(raw) => raw
                .parse::<usize>()
                .context("BODY_LIMIT must be a size in bytes")?,
            Err(_) => DEFAULT_BODY_LIMIT,
        };

        Ok(Config {
            spanner_emulator_host,
            spanner_project,
            spanner_instance,
            spanner_database,
            service_port,
            service_host,
            client_origin,
            body_limit,
        })
    }

    /// Fully qualified Spanner database path
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.spanner_project, self.spanner_instance, self.spanner_database
        )
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.service_host, self.service_port)
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Spanner emulator: {}",
            self.spanner_emulator_host.as_deref().unwrap_or("disabled (using production)"));
        tracing::info!("  Spanner database: {}", self.database_path());
        tracing::info!("  CORS origin: {}", self.client_origin);
        tracing::info!("  Body limit: {} bytes", self.body_limit);
        tracing::info!("  Service listening on: {}", self.bind_addr());
    }
}

/// Configuration for [`crate::client::ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without the `/api` suffix
    pub api_root: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let api_root = env::var("API_ROOT")
            .context("API_ROOT environment variable is required")?;

        Ok(ClientConfig { api_root })
    }
}
