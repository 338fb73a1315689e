//! Secret overlay
//!
//! Overwrites secret-bound configuration fields with the latest payloads
//! from the secret store. Runs after the document and environment have been
//! merged, so a secret always wins over any other source for its field.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, instrument, warn};

use crate::domain::errors::{ConfigError, ConfigResult};
use crate::domain::models::config::Configuration;
use crate::domain::models::secret::{SecretBinding, SECRET_BINDINGS};
use crate::domain::ports::SecretStore;

/// Applies a fixed set of [`SecretBinding`]s to a resolved configuration
pub struct SecretOverlayResolver {
    store: Arc<dyn SecretStore>,
    bindings: &'static [SecretBinding],
}

impl SecretOverlayResolver {
    /// Resolver for every binding in [`SECRET_BINDINGS`]
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            bindings: SECRET_BINDINGS,
        }
    }

    pub const fn with_bindings(mut self, bindings: &'static [SecretBinding]) -> Self {
        self.bindings = bindings;
        self
    }

    /// Fetch every bound secret and write it into `config`.
    ///
    /// Each distinct secret is requested once even when several fields use
    /// it. Requests run concurrently; fields are written in binding order
    /// only after every request succeeded, so a failure leaves `config`
    /// untouched. An empty payload is written as-is.
    #[instrument(skip_all, fields(bindings = self.bindings.len()))]
    pub async fn apply(&self, config: &mut Configuration) -> ConfigResult<()> {
        let project_id = config.gcloud.project_id.clone();
        if project_id.is_empty() {
            return Err(ConfigError::SecretStoreInit(
                "gcloud.projectId is empty; cannot address secrets".to_string(),
            ));
        }

        let mut distinct: Vec<&SecretBinding> = Vec::new();
        for binding in self.bindings {
            if !distinct.iter().any(|seen| seen.secret == binding.secret) {
                distinct.push(binding);
            }
        }

        let project_id = project_id.as_str();
        let fetches = distinct.iter().map(|binding| async move {
            let bytes = self
                .store
                .access_latest(project_id, binding.secret)
                .await
                .map_err(|e| ConfigError::SecretFetch {
                    secret: binding.secret.to_string(),
                    field: binding.field.path(),
                    reason: e.to_string(),
                })?;
            let value = String::from_utf8(bytes).map_err(|e| ConfigError::SecretFetch {
                secret: binding.secret.to_string(),
                field: binding.field.path(),
                reason: format!("payload is not valid UTF-8: {e}"),
            })?;
            Ok::<_, ConfigError>((binding.secret, value))
        });
        let values: BTreeMap<&str, String> = try_join_all(fetches).await?.into_iter().collect();

        for binding in self.bindings {
            let Some(value) = values.get(binding.secret) else {
                continue;
            };
            if value.is_empty() {
                warn!(
                    secret = binding.secret,
                    field = binding.field.path(),
                    "secret store returned an empty payload"
                );
            }
            value.clone_into(binding.field.slot(config));
        }

        info!(
            secrets = values.len(),
            fields = self.bindings.len(),
            "applied secret overlay"
        );
        Ok(())
    }
}
