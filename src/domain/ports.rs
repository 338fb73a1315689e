use async_trait::async_trait;

/// Error type for secret store operations
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SecretStoreError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("Secret store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed secret payload: {0}")]
    MalformedPayload(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl SecretStoreError {
    /// Returns true if retrying the same request may succeed
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Versioned secret storage
///
/// Implementations resolve a secret by project and logical name and return
/// the raw payload of its newest version. Only the latest version is ever
/// requested; pinning versions is not part of the contract.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the payload of the latest version of `secret` in `project_id`
    ///
    /// # Returns
    /// * `Ok(bytes)` - Raw payload, not yet decoded
    /// * `Err(SecretStoreError)` - Secret missing, access denied or store unreachable
    async fn access_latest(
        &self,
        project_id: &str,
        secret: &str,
    ) -> Result<Vec<u8>, SecretStoreError>;
}
