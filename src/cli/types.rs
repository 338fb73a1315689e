//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::keys::KeysArgs;
use super::commands::show::ShowArgs;
use crate::infrastructure::logging::{LogConfig, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Resolve layered service configuration", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Directory containing config.{yaml,yml,toml,json}
    #[arg(short, long, global = true, env = "STRATA_CONFIG_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, env = "STRATA_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Console log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also write JSON logs to a rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            format: self.log_format,
            log_dir: self.log_dir.clone(),
            ..LogConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the configuration and print it with secrets redacted
    Show(ShowArgs),

    /// List the environment variable bound to every configuration key
    Keys(KeysArgs),
}
