//! Google Secret Manager REST client

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::retry::RetryPolicy;
use crate::domain::models::config::{Configuration, DEFAULT_SECRET_MANAGER_URL};
use crate::domain::models::secret::latest_version_name;
use crate::domain::ports::{SecretStore, SecretStoreError};
use crate::infrastructure::config::EnvSnapshot;

/// Environment variable holding a pre-issued OAuth access token.
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// GCE/GKE metadata server, used when no token is supplied.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Configuration for the Secret Manager HTTP client
#[derive(Debug, Clone)]
pub struct SecretManagerConfig {
    /// Base URL of the Secret Manager API
    pub base_url: String,
    /// Bearer token; fetched from the metadata server when absent
    pub access_token: Option<String>,
    /// Base URL of the metadata server
    pub metadata_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for SecretManagerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SECRET_MANAGER_URL.to_string(),
            access_token: None,
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl SecretManagerConfig {
    /// Client settings derived from resolved configuration and the environment.
    pub fn from_configuration(config: &Configuration, env: &EnvSnapshot) -> Self {
        Self {
            base_url: config.gcloud.secret_manager_url.clone(),
            access_token: env
                .get(ACCESS_TOKEN_VAR)
                .filter(|token| !token.is_empty())
                .map(ToString::to_string),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Secret store backed by the Secret Manager `versions/latest:access` endpoint
///
/// Features:
/// - Connection reuse via a single `reqwest::Client`
/// - Request timeout on every call
/// - Exponential backoff for transient errors (429, 5xx, network)
/// - Metadata-server token fetched once and cached
pub struct SecretManagerClient {
    http_client: ReqwestClient,
    base_url: String,
    metadata_url: String,
    static_token: Option<String>,
    metadata_token: OnceCell<String>,
    retry_policy: RetryPolicy,
}

impl SecretManagerClient {
    pub fn new(config: SecretManagerConfig) -> Result<Self, SecretStoreError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SecretStoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            metadata_url: config.metadata_url.trim_end_matches('/').to_string(),
            static_token: config.access_token,
            metadata_token: OnceCell::new(),
            retry_policy: config.retry,
        })
    }

    async fn access_token(&self) -> Result<&str, SecretStoreError> {
        if let Some(token) = &self.static_token {
            return Ok(token);
        }
        self.metadata_token
            .get_or_try_init(|| self.fetch_metadata_token())
            .await
            .map(String::as_str)
    }

    async fn fetch_metadata_token(&self) -> Result<String, SecretStoreError> {
        let response = self
            .http_client
            .get(format!("{}{METADATA_TOKEN_PATH}", self.metadata_url))
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SecretStoreError::Authentication(format!("metadata server unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(SecretStoreError::Authentication(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| SecretStoreError::Authentication(format!("invalid token response: {e}")))?;
        debug!("obtained access token from metadata server");
        Ok(token.access_token)
    }

    async fn fetch_once(&self, project_id: &str, secret: &str) -> Result<Vec<u8>, SecretStoreError> {
        let name = latest_version_name(project_id, secret);
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(format!("{}/v1/{name}:access", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretStoreError::Unavailable(format!("request for {name} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(error_from_status(status, &name, body));
        }

        let version: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| SecretStoreError::MalformedPayload(format!("{name}: {e}")))?;

        STANDARD
            .decode(version.payload.data.as_bytes())
            .map_err(|e| SecretStoreError::MalformedPayload(format!("{name}: {e}")))
    }
}

/// Map an HTTP error status to a secret store error.
fn error_from_status(status: StatusCode, name: &str, body: String) -> SecretStoreError {
    match status.as_u16() {
        401 => SecretStoreError::Authentication(body),
        403 => SecretStoreError::PermissionDenied(name.to_string()),
        404 => SecretStoreError::NotFound(name.to_string()),
        429 | 500..=599 => SecretStoreError::Unavailable(format!("HTTP {status}: {body}")),
        _ => SecretStoreError::Rejected(format!("HTTP {status} for {name}: {body}")),
    }
}

#[async_trait]
impl SecretStore for SecretManagerClient {
    #[instrument(skip(self), fields(store = "secret-manager"))]
    async fn access_latest(
        &self,
        project_id: &str,
        secret: &str,
    ) -> Result<Vec<u8>, SecretStoreError> {
        self.retry_policy
            .execute(|| self.fetch_once(project_id, secret))
            .await
    }
}
