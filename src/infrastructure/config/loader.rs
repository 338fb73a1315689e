use std::path::Path;

use tracing::{debug, instrument};

use super::env::{EnvKeyMap, EnvOverlay, EnvSnapshot};
use super::source::{DocumentFormat, SourceSpec};
use super::tree;
use crate::domain::errors::{ConfigError, ConfigResult};
use crate::domain::models::config::{ConsumerConfig, Configuration};

/// Document name searched for by [`ConfigLoader::new`].
pub const CONFIG_DOCUMENT: &str = "config";

/// Configuration loader with hierarchical merging
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: SourceSpec,
    overlay: EnvOverlay,
}

impl ConfigLoader {
    /// Loader for `dir/config.{yaml,yml,toml,json}` with `.` -> `_` env mapping
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            source: SourceSpec::new(
                dir.as_ref(),
                CONFIG_DOCUMENT,
                [DocumentFormat::Yaml, DocumentFormat::Toml, DocumentFormat::Json],
            ),
            overlay: EnvOverlay::hierarchical(),
        }
    }

    pub fn with_source(mut self, source: SourceSpec) -> Self {
        self.source = source;
        self
    }

    pub fn with_overlay(mut self, overlay: EnvOverlay) -> Self {
        self.overlay = overlay;
        self
    }

    pub const fn source(&self) -> &SourceSpec {
        &self.source
    }

    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. `Configuration::default()`
    /// 2. The structured document
    /// 3. Environment variables (`database.flipDbMaster.host` -> `DATABASE_FLIPDBMASTER_HOST`)
    ///
    /// Every leaf of the shape is bound, plus every leaf the document adds
    /// (entries of map-typed sections such as `squadcastService.stateId`).
    #[instrument(skip_all, fields(dir = %self.source.dir().display()))]
    pub fn load(&self, env: &EnvSnapshot) -> ConfigResult<Configuration> {
        let document = self.source.read()?;
        let shape = tree::shape_tree::<Configuration>()?;

        let mut doc = tree::canonicalize(document.into_value(), Some(&shape));
        tree::conform(&mut doc, Some(&shape));

        let mut base = shape;
        tree::merge(&mut base, doc.clone());
        let keys = self.bind(&base)?;
        let overrides = self.overlay.overrides(&keys, env, &base);

        let config: Configuration =
            tree::extract(doc, overrides).map_err(|e| keys.explain(e, env))?;
        Self::validate(&config)?;
        debug!(bound = keys.len(), env = %config.app.env, "configuration loaded");
        Ok(config)
    }

    /// Environment bindings for the shape merged with the current document.
    ///
    /// A missing document lists the shape keys alone; a malformed one is an error.
    pub fn env_keys(&self) -> ConfigResult<EnvKeyMap> {
        let shape = tree::shape_tree::<Configuration>()?;
        let mut base = shape.clone();
        if self.source.locate().is_ok() {
            let document = self.source.read()?;
            tree::merge(
                &mut base,
                tree::canonicalize(document.into_value(), Some(&shape)),
            );
        } else {
            debug!(dir = %self.source.dir().display(), "no document, listing shape keys only");
        }
        self.bind(&base)
    }

    fn bind(&self, base: &serde_json::Value) -> ConfigResult<EnvKeyMap> {
        self.overlay.bind(tree::leaf_paths(base))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Configuration) -> ConfigResult<()> {
        if config.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be set".to_string(),
            ));
        }

        if config.consumers.enable {
            validate_consumer("consumers.decisionSession", &config.consumers.decision_session)?;
            validate_consumer(
                "consumers.decisionTransaction",
                &config.consumers.decision_transaction,
            )?;
        }

        Ok(())
    }
}

fn validate_consumer(key: &str, consumer: &ConsumerConfig) -> ConfigResult<()> {
    if !consumer.toggle {
        return Ok(());
    }
    if consumer.max_outstanding_messages <= 0 {
        return Err(ConfigError::Validation(format!(
            "{key}.maxOutstandingMessages must be positive, got {}",
            consumer.max_outstanding_messages
        )));
    }
    if consumer.num_goroutines <= 0 {
        return Err(ConfigError::Validation(format!(
            "{key}.numGoroutines must be positive, got {}",
            consumer.num_goroutines
        )));
    }
    Ok(())
}
