//! Configuration management infrastructure
//!
//! Layered configuration using figment:
//! - Structured document loading (YAML, TOML, JSON, dotenv)
//! - Environment variable overrides
//! - Generic binding for flat shapes
//! - Hierarchical loading and validation of [`Configuration`](crate::domain::models::Configuration)

pub mod binder;
pub mod env;
pub mod loader;
pub mod source;
pub mod tree;

pub use binder::{load_config, resolve};
pub use env::{EnvKey, EnvKeyMap, EnvOverlay, EnvSnapshot, KeyMapping};
pub use loader::ConfigLoader;
pub use source::{DocumentFormat, RawDocument, SourceSpec};
