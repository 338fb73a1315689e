//! Domain layer for configuration resolution
//!
//! This module contains the configuration shape, the static secret bindings,
//! the error taxonomy and the ports implemented by infrastructure adapters.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ConfigError, ConfigResult};
