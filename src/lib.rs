//! Strata - layered configuration resolution
//!
//! Resolves process configuration from a structured document, environment
//! variables and a remote secret store into one strongly-typed value that is
//! built once per process.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Configuration shape, secret bindings, errors and ports
//! - **Service Layer** (`services`): Secret overlay and the configuration registry
//! - **Infrastructure Layer** (`infrastructure`): Document sources, environment overlay, Secret Manager client, logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use strata::{ConfigLoader, ConfigRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ConfigRegistry::builder(ConfigLoader::new("/etc/flip")).build();
//!     let config = registry.get_or_initialize().await?;
//!     println!("listening on {}", config.server.port);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{ConfigError, ConfigResult};
pub use domain::models::{Configuration, SecretBinding, SecretField, SECRET_BINDINGS};
pub use domain::ports::{SecretStore, SecretStoreError};
pub use infrastructure::config::{load_config, ConfigLoader, EnvOverlay, EnvSnapshot};
pub use services::{ConfigRegistry, PostMergeOption, SecretOverlayResolver};
