//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use strata::{SecretStore, SecretStoreError};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write `contents` to `dir/name`
pub fn write_document(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("Failed to write document");
}

/// Temporary directory holding a `config.yaml` with `contents`
pub fn config_dir(contents: &str) -> TempDir {
    let dir = temp_dir();
    write_document(dir.path(), "config.yaml", contents);
    dir
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// In-memory secret store that counts requests
#[derive(Debug, Default)]
pub struct FakeSecretStore {
    secrets: HashMap<String, String>,
    requests: AtomicUsize,
}

impl FakeSecretStore {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            secrets: entries
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
            requests: AtomicUsize::new(0),
        }
    }

    /// Store holding `value` for every bound secret
    pub fn filled(value: &str) -> Self {
        let entries: Vec<(&str, &str)> = strata::SECRET_BINDINGS
            .iter()
            .map(|binding| (binding.secret, value))
            .collect();
        Self::with(&entries)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn access_latest(
        &self,
        project_id: &str,
        secret: &str,
    ) -> Result<Vec<u8>, SecretStoreError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent callers interleave with the fetch.
        tokio::task::yield_now().await;
        self.secrets
            .get(secret)
            .map(|value| value.as_bytes().to_vec())
            .ok_or_else(|| SecretStoreError::NotFound(format!("{project_id}/{secret}")))
    }
}
