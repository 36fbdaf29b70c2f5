// Authenticated API client for the mounted routes

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::routes::API_PREFIX;

/// Why a credential provider could not produce a token
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("session provider error: {0}")]
    Provider(String),
}

/// Source of the bearer token attached to every request
///
/// Implementations may refresh or validate the session before answering. The
/// client asks again on every call and never keeps the token.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn id_token(&self) -> Result<String, CredentialError>;
}

/// Credential provider that always answers with the same token
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn id_token(&self) -> Result<String, CredentialError> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to resolve credentials")]
    Credentials(#[from] CredentialError),
    #[error("failed to serialize request payload")]
    Payload(#[source] serde_json::Error),
    #[error("request failed")]
    Request(#[from] reqwest::Error),
    #[error("response body is not valid JSON")]
    Decode(#[source] serde_json::Error),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_http_client(reqwest::Client::new(), config, credentials)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        config: &ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            base_url: format!("{}{}", config.api_root, API_PREFIX),
            credentials,
        }
    }

    /// `{api_root}/api`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the decoded JSON body
    ///
    /// The body is sent only when `payload` is `Some`. The response status is
    /// not inspected: whatever JSON the server answers with is returned.
    pub async fn call<P>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<JsonValue, ClientError>
    where
        P: Serialize + ?Sized,
    {
        self.call_as(method, path, payload).await
    }

    /// Like [`ApiClient::call`], decoding into `T`
    pub async fn call_as<T, P>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let request = self.prepare(method, path, payload).await?;
        tracing::debug!("{} {}", request.method(), request.url());

        let response = self.http.execute(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }

    /// Build the request a call would send, resolving credentials first
    pub async fn prepare<P>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<reqwest::Request, ClientError>
    where
        P: Serialize + ?Sized,
    {
        let token = self.credentials.id_token().await?;
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(token);

        if let Some(payload) = payload {
            let body = serde_json::to_vec(payload).map_err(ClientError::Payload)?;
            builder = builder.body(body);
        }

        Ok(builder.build()?)
    }
}
