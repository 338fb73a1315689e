pub mod registry;
pub mod secret_overlay;

pub use registry::{
    global, install, override_env, override_project_id, override_server_port, ConfigRegistry,
    ConfigRegistryBuilder, PostMergeOption, SecretStoreFactory,
};
pub use secret_overlay::SecretOverlayResolver;
