//! Infrastructure layer module
//!
//! Adapters behind the domain types and ports:
//! - Document sources, environment overlay and struct binding
//! - Secret Manager client
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod secrets;
