pub mod config;
pub mod secret;

pub use config::{
    AppConfiguration, CommServiceConfiguration, Configuration, DbConfig, GCloudConfiguration,
    SquadcastServiceConfiguration, DEFAULT_SECRET_MANAGER_URL, LOCAL_ENV,
};
pub use secret::{latest_version_name, SecretBinding, SecretField, SECRET_BINDINGS};
