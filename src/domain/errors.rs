//! Domain errors for configuration resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving configuration.
///
/// Every variant names the source that failed (document, environment or
/// secret store) together with the key or secret involved, so a failed
/// startup can be diagnosed from the message alone. Payloads are plain
/// strings so the error can be memoized and handed to every caller of a
/// failed initialization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Document {} is unreadable: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("Environment binding for key '{key}' failed: {reason}")]
    Binding { key: String, reason: String },

    #[error("Unable to decode configuration into {shape}: {reason}")]
    Unmarshal { shape: &'static str, reason: String },

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Secret store setup failed: {0}")]
    SecretStoreInit(String),

    #[error("Failed to load secret '{secret}' for {field}: {reason}")]
    SecretFetch {
        secret: String,
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    /// Name of the source that produced this error.
    pub const fn source_kind(&self) -> &'static str {
        match self {
            Self::SourceUnreadable { .. } | Self::Unmarshal { .. } | Self::Validation(_) => {
                "document"
            }
            Self::Binding { .. } => "environment",
            Self::SecretStoreInit(_) | Self::SecretFetch { .. } => "secret",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unreadable_names_path() {
        let err = ConfigError::SourceUnreadable {
            path: PathBuf::from("/etc/app/config.yaml"),
            reason: "not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Document /etc/app/config.yaml is unreadable: not found"
        );
        assert_eq!(err.source_kind(), "document");
    }

    #[test]
    fn test_secret_fetch_names_secret_and_field() {
        let err = ConfigError::SecretFetch {
            secret: "flip-db-password".to_string(),
            field: "database.flipDbMaster.password",
            reason: "permission denied".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("flip-db-password"));
        assert!(message.contains("database.flipDbMaster.password"));
        assert_eq!(err.source_kind(), "secret");
    }

    #[test]
    fn test_binding_is_environment_error() {
        let err = ConfigError::Binding {
            key: "a=b".to_string(),
            reason: "contains '='".to_string(),
        };
        assert_eq!(err.source_kind(), "environment");
    }
}
