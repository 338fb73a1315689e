//! Configuration registry
//!
//! Owns the one-time resolution of [`Configuration`] and hands out the
//! resolved instance afterwards. Resolution runs at most once per registry:
//! concurrent first callers wait on the same gate and all observe the same
//! outcome, including a failure. The registry is an ordinary value so tests
//! can build as many independent instances as they need; [`install`] and
//! [`global`] provide a single process-wide slot for the composition root.

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};

use crate::domain::errors::{ConfigError, ConfigResult};
use crate::domain::models::config::Configuration;
use crate::domain::ports::{SecretStore, SecretStoreError};
use crate::infrastructure::config::{ConfigLoader, EnvSnapshot};
use crate::infrastructure::secrets::{SecretManagerClient, SecretManagerConfig};
use crate::services::secret_overlay::SecretOverlayResolver;

/// Builds the secret store once the non-secret configuration is known.
///
/// Only invoked when the resolved environment is not `local`.
pub type SecretStoreFactory = Box<
    dyn Fn(&Configuration, &EnvSnapshot) -> Result<Arc<dyn SecretStore>, SecretStoreError>
        + Send
        + Sync,
>;

/// A named transformation applied after the primary merge and before the
/// secret overlay.
pub struct PostMergeOption {
    name: &'static str,
    apply: Box<dyn Fn(&mut Configuration) + Send + Sync>,
}

impl PostMergeOption {
    pub fn new<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(&mut Configuration) + Send + Sync + 'static,
    {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, config: &mut Configuration) {
        (self.apply)(config);
    }
}

impl fmt::Debug for PostMergeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostMergeOption")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Force `app.env`, e.g. to `local` on a developer machine.
pub fn override_env(env: impl Into<String>) -> PostMergeOption {
    let env = env.into();
    PostMergeOption::new("override_env", move |config| config.app.env.clone_from(&env))
}

/// Force the listening port.
pub fn override_server_port(port: u16) -> PostMergeOption {
    PostMergeOption::new("override_server_port", move |config| config.server.port = port)
}

/// Force the project the secrets are read from.
pub fn override_project_id(project_id: impl Into<String>) -> PostMergeOption {
    let project_id = project_id.into();
    PostMergeOption::new("override_project_id", move |config| {
        config.gcloud.project_id.clone_from(&project_id);
    })
}

fn secret_manager_factory() -> SecretStoreFactory {
    Box::new(|config: &Configuration, env: &EnvSnapshot| {
        let client = SecretManagerClient::new(SecretManagerConfig::from_configuration(config, env))?;
        Ok(Arc::new(client) as Arc<dyn SecretStore>)
    })
}

/// Process configuration with gated one-time initialization
pub struct ConfigRegistry {
    loader: ConfigLoader,
    env: Option<EnvSnapshot>,
    options: Vec<PostMergeOption>,
    secret_store: SecretStoreFactory,
    gate: OnceCell<ConfigResult<Arc<Configuration>>>,
    current: RwLock<Option<Arc<Configuration>>>,
}

impl ConfigRegistry {
    pub fn builder(loader: ConfigLoader) -> ConfigRegistryBuilder {
        ConfigRegistryBuilder {
            loader,
            env: None,
            options: Vec::new(),
            secret_store: None,
        }
    }

    /// Resolve the configuration on first call; return the resolved instance afterwards.
    ///
    /// Sequence: read document, apply environment overlay, unmarshal and
    /// validate, apply post-merge options in order, then overlay secrets
    /// unless `app.env` is `local`. The outcome is memoized: later and
    /// concurrent callers never re-run any step and receive the same
    /// instance or the same error.
    pub async fn get_or_initialize(&self) -> ConfigResult<Arc<Configuration>> {
        let outcome = self
            .gate
            .get_or_init(|| async {
                match self.initialize().await {
                    Ok(config) => {
                        let config = Arc::new(config);
                        *self.current.write().unwrap_or_else(PoisonError::into_inner) =
                            Some(Arc::clone(&config));
                        Ok(config)
                    }
                    Err(err) => {
                        error!(source = err.source_kind(), error = %err, "configuration resolution failed");
                        Err(err)
                    }
                }
            })
            .await;

        match outcome {
            Ok(resolved) => Ok(self.get().unwrap_or_else(|| Arc::clone(resolved))),
            Err(err) => Err(err.clone()),
        }
    }

    /// The resolved configuration, or `None` if resolution has not happened yet.
    ///
    /// Never triggers resolution.
    pub fn get(&self) -> Option<Arc<Configuration>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Suffix appended to tracing names; empty before initialization.
    pub fn suffix_for_tracing(&self) -> String {
        self.get()
            .map(|config| config.suffix_for_tracing().to_string())
            .unwrap_or_default()
    }

    /// Replace the held configuration, bypassing the one-time gate.
    ///
    /// Closes the gate if it is still open, so a later
    /// [`get_or_initialize`](Self::get_or_initialize) returns this instance
    /// instead of resolving. Not meant for concurrent use.
    pub fn override_for_test(&self, config: Configuration) {
        let config = Arc::new(config);
        if self.gate.set(Ok(Arc::clone(&config))).is_err() {
            debug!("registry already initialized, replacing held configuration");
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
    }

    #[instrument(skip_all, fields(dir = %self.loader.source().dir().display()))]
    async fn initialize(&self) -> ConfigResult<Configuration> {
        let env = self.env.clone().unwrap_or_else(EnvSnapshot::from_process);
        let mut config = self.loader.load(&env)?;

        for option in &self.options {
            debug!(option = option.name(), "applying post-merge option");
            option.apply(&mut config);
        }

        if config.is_local() {
            info!("local environment, skipping secret overlay");
        } else {
            let store = (self.secret_store)(&config, &env)
                .map_err(|e| ConfigError::SecretStoreInit(e.to_string()))?;
            SecretOverlayResolver::new(store).apply(&mut config).await?;
        }

        info!(env = %config.app.env, version = %config.app.version, "configuration resolved");
        Ok(config)
    }
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("loader", &self.loader)
            .field("options", &self.options)
            .field("initialized", &self.gate.initialized())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConfigRegistry`]
pub struct ConfigRegistryBuilder {
    loader: ConfigLoader,
    env: Option<EnvSnapshot>,
    options: Vec<PostMergeOption>,
    secret_store: Option<SecretStoreFactory>,
}

impl ConfigRegistryBuilder {
    /// Resolve against a fixed snapshot instead of the process environment.
    pub fn env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    /// Append a post-merge option; options run in the order added.
    pub fn option(mut self, option: PostMergeOption) -> Self {
        self.options.push(option);
        self
    }

    /// Use an existing secret store.
    pub fn secret_store(self, store: Arc<dyn SecretStore>) -> Self {
        self.secret_store_factory(move |_, _| Ok(Arc::clone(&store)))
    }

    pub fn secret_store_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Configuration, &EnvSnapshot) -> Result<Arc<dyn SecretStore>, SecretStoreError>
            + Send
            + Sync
            + 'static,
    {
        self.secret_store = Some(Box::new(factory));
        self
    }

    /// Defaults to the Secret Manager client when no store was given.
    pub fn build(self) -> ConfigRegistry {
        ConfigRegistry {
            loader: self.loader,
            env: self.env,
            options: self.options,
            secret_store: self.secret_store.unwrap_or_else(secret_manager_factory),
            gate: OnceCell::new(),
            current: RwLock::new(None),
        }
    }
}

static GLOBAL: OnceLock<ConfigRegistry> = OnceLock::new();

/// Install the process-wide registry. Fails, returning it, if one is already installed.
pub fn install(registry: ConfigRegistry) -> Result<(), ConfigRegistry> {
    GLOBAL.set(registry)
}

/// The process-wide registry, if installed.
pub fn global() -> Option<&'static ConfigRegistry> {
    GLOBAL.get()
}
