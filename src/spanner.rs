use anyhow::{Context, Result};
use async_trait::async_trait;
use gcloud_gax::grpc::Code;
use gcloud_googleapis::spanner::admin::database::v1::{CreateDatabaseRequest, GetDatabaseRequest};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::statement::Statement;
use std::sync::Arc;

use crate::config::Config;
use crate::connection::{ConnectionProvider, SharedConnection};

/// Shareable Spanner client for use across async handlers
#[derive(Clone)]
pub struct SpannerClient {
    inner: Arc<Client>,
}

impl SpannerClient {
    /// Create a new Spanner client from configuration
    ///
    /// The gcloud-spanner library picks up SPANNER_EMULATOR_HOST on its own.
    /// When the emulator is in use the instance and database are created if
    /// they don't exist yet.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let database_path = config.database_path();

        if let Some(emulator_host) = &config.spanner_emulator_host {
            tracing::info!("Connecting to Spanner emulator at: {}", emulator_host);
            auto_provision(config).await?;
        } else {
            tracing::info!("Connecting to production Spanner");
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {}",
            database_path
        );

        Ok(Self {
            inner: Arc::new(client),
        })
    }

    /// Get a reference to the underlying Spanner client
    pub fn client(&self) -> &Client {
        &self.inner
    }

    /// Run `SELECT 1` to verify the database answers queries
    pub async fn health_check(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1");

        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create health check transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute health check query")?;

        if result_set.next().await?.is_some() {
            tracing::debug!("Health check query succeeded");
            Ok(())
        } else {
            Err(anyhow::anyhow!("Health check query returned no results"))
        }
    }
}

/// Connection provider backed by Cloud Spanner
///
/// Nothing is dialed until the first request asks for a connection. From then
/// on every request receives a clone of the same client.
pub struct SpannerConnector {
    config: Arc<Config>,
    shared: SharedConnection<SpannerClient>,
}

impl SpannerConnector {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            shared: SharedConnection::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }
}

#[async_trait]
impl ConnectionProvider for SpannerConnector {
    type Connection = SpannerClient;

    async fn connect(&self) -> Result<SpannerClient> {
        self.shared
            .get_or_connect(|| SpannerClient::from_config(&self.config))
            .await
    }

    async fn ping(&self, connection: &SpannerClient) -> Result<()> {
        connection.health_check().await
    }
}

/// Resource names the emulator must hold before the client can connect
#[derive(Debug, PartialEq)]
struct EmulatorLayout {
    project: String,
    instance: String,
    instance_config: String,
    database: String,
}

impl EmulatorLayout {
    fn from_config(config: &Config) -> Self {
        let project = format!("projects/{}", config.spanner_project);
        Self {
            instance: format!("{}/instances/{}", project, config.spanner_instance),
            instance_config: format!("{}/instanceConfigs/emulator-config", project),
            database: config.database_path(),
            project,
        }
    }
}

/// `true` when a lookup reports the resource as not found
fn absent<T>(lookup: std::result::Result<T, (Code, String)>, resource: &str) -> Result<bool> {
    match lookup {
        Ok(_) => Ok(false),
        Err((Code::NotFound, _)) => Ok(true),
        Err((code, message)) => Err(anyhow::anyhow!(
            "Emulator lookup of {} failed ({:?}): {}",
            resource,
            code,
            message
        )),
    }
}

/// Create the emulator instance and database when they are missing
async fn auto_provision(config: &Config) -> Result<()> {
    let layout = EmulatorLayout::from_config(config);
    let admin = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Spanner admin client unavailable")?;

    let instance_lookup = admin
        .instance()
        .get_instance(
            GetInstanceRequest {
                name: layout.instance.clone(),
                field_mask: None,
            },
            None,
        )
        .await
        .map_err(|status| (status.code(), status.message().to_string()));

    if absent(instance_lookup, &layout.instance)? {
        tracing::info!(instance = %layout.instance, "Provisioning emulator instance");
        let request = CreateInstanceRequest {
            parent: layout.project.clone(),
            instance_id: config.spanner_instance.clone(),
            instance: Some(Instance {
                name: layout.instance.clone(),
                config: layout.instance_config.clone(),
                display_name: config.spanner_instance.clone(),
                node_count: 1,
                ..Default::default()
            }),
        };
        admin
            .instance()
            .create_instance(request, None)
            .await
            .with_context(|| format!("Emulator refused to create {}", layout.instance))?
            .wait(None)
            .await
            .with_context(|| format!("Creation of {} did not finish", layout.instance))?;
    }

    let database_lookup = admin
        .database()
        .get_database(
            GetDatabaseRequest {
                name: layout.database.clone(),
            },
            None,
        )
        .await
        .map_err(|status| (status.code(), status.message().to_string()));

    if absent(database_lookup, &layout.database)? {
        tracing::info!(database = %layout.database, "Provisioning emulator database");
        let request = CreateDatabaseRequest {
            parent: layout.instance.clone(),
            create_statement: format!("CREATE DATABASE `{}`", config.spanner_database),
            extra_statements: vec![],
            encryption_config: None,
            // GoogleSQL
            database_dialect: 1,
            proto_descriptors: vec![],
        };
        admin
            .database()
            .create_database(request, None)
            .await
            .with_context(|| format!("Emulator refused to create {}", layout.database))?
            .wait(None)
            .await
            .with_context(|| format!("Creation of {} did not finish", layout.database))?;
    }

    tracing::debug!(database = %layout.database, "Emulator resources ready");
    Ok(())
}
