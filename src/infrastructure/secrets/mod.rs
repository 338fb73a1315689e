//! Secret store adapters
//!
//! - Google Secret Manager REST client
//! - Retry policy for transient store failures

pub mod client;
pub mod retry;

pub use client::{SecretManagerClient, SecretManagerConfig, ACCESS_TOKEN_VAR};
pub use retry::RetryPolicy;
