//! Implementation of the `strata show` command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::config::Configuration;
use crate::domain::models::secret::redact;
use crate::infrastructure::config::ConfigLoader;
use crate::services::registry::{
    self, override_env, override_project_id, override_server_port, ConfigRegistry,
};

/// Printed in place of every non-empty secret-bound field.
pub const REDACTED: &str = "<redacted>";

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Force app.env after merging (e.g. "local" to skip the secret store)
    #[arg(long = "app-env")]
    pub app_env: Option<String>,

    /// Force server.port after merging
    #[arg(long)]
    pub port: Option<u16>,

    /// Force gcloud.projectId after merging
    #[arg(long)]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub env: String,
    pub config: Configuration,
}

impl ShowOutput {
    pub fn redacted(config: &Configuration) -> Self {
        let mut config = config.clone();
        redact(&mut config, REDACTED);
        Self {
            env: config.env().to_string(),
            config,
        }
    }
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        let body = serde_yaml::to_string(&self.config)
            .unwrap_or_else(|e| format!("failed to render configuration: {e}"));
        format!("# env: {}\n{body}", self.env)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Registry for `dir` with the post-merge options requested on the command line.
pub fn build_registry(dir: &Path, args: ShowArgs) -> ConfigRegistry {
    let mut builder = ConfigRegistry::builder(ConfigLoader::new(dir));
    if let Some(env) = args.app_env {
        builder = builder.option(override_env(env));
    }
    if let Some(port) = args.port {
        builder = builder.option(override_server_port(port));
    }
    if let Some(project_id) = args.project_id {
        builder = builder.option(override_project_id(project_id));
    }
    builder.build()
}

pub async fn execute(dir: &Path, args: ShowArgs, json_mode: bool) -> Result<()> {
    if registry::install(build_registry(dir, args)).is_err() {
        anyhow::bail!("configuration registry is already installed");
    }
    let registry = registry::global().context("configuration registry is not installed")?;

    let config = registry
        .get_or_initialize()
        .await
        .with_context(|| format!("Failed to resolve configuration from {}", dir.display()))?;

    output(&ShowOutput::redacted(&config), json_mode);
    Ok(())
}
