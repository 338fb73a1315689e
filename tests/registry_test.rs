//! End-to-end resolution through the configuration registry

mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{config_dir, setup_test_logging, FakeSecretStore};
use strata::domain::models::secret::{FLIP_DB_PASSWORD, PORTA_API_KEY};
use strata::services::registry::{override_env, override_project_id};
use strata::{
    ConfigError, ConfigLoader, ConfigRegistry, EnvSnapshot, SecretStore, SecretStoreError,
    SECRET_BINDINGS,
};

const PRODUCTION_DOCUMENT: &str = "\
App:
  Env: production
  SuffixForTracing: -prod
Server:
  Port: 8080
GCloud:
  ProjectId: flip-prod
Database:
  FlipDBMaster:
    Host: db.internal
    Password: from-document
";

fn distinct_secrets() -> usize {
    SECRET_BINDINGS
        .iter()
        .map(|binding| binding.secret)
        .collect::<HashSet<_>>()
        .len()
}

fn registry(dir: &tempfile::TempDir, env: EnvSnapshot, store: Arc<FakeSecretStore>) -> ConfigRegistry {
    ConfigRegistry::builder(ConfigLoader::new(dir.path()))
        .env(env)
        .secret_store(store)
        .build()
}

#[tokio::test]
async fn test_secret_wins_over_document_and_environment() {
    setup_test_logging();
    let dir = config_dir(PRODUCTION_DOCUMENT);
    let env: EnvSnapshot = [("DATABASE_FLIPDBMASTER_PASSWORD", "from-env")]
        .into_iter()
        .collect();
    let store = Arc::new(FakeSecretStore::with(
        &SECRET_BINDINGS
            .iter()
            .map(|binding| {
                let value = if binding.secret == FLIP_DB_PASSWORD { "s3cr3t" } else { "x" };
                (binding.secret, value)
            })
            .collect::<Vec<_>>(),
    ));

    let config = registry(&dir, env, store).get_or_initialize().await.unwrap();

    assert_eq!(config.database.flip_db_master.password, "s3cr3t");
    assert_eq!(config.database.flip_db_slave.password, "s3cr3t");
    assert_eq!(config.database.flip_db_master.host, "db.internal");
}

#[tokio::test]
async fn test_environment_wins_over_document_when_local() {
    let dir = config_dir(PRODUCTION_DOCUMENT);
    let env: EnvSnapshot = [
        ("APP_ENV", "local"),
        ("DATABASE_FLIPDBMASTER_PASSWORD", "from-env"),
        ("SERVER_PORT", "9000"),
    ]
    .into_iter()
    .collect();
    let store = Arc::new(FakeSecretStore::default());

    let config = registry(&dir, env, Arc::clone(&store))
        .get_or_initialize()
        .await
        .unwrap();

    assert!(config.is_local());
    assert_eq!(config.database.flip_db_master.password, "from-env");
    assert_eq!(config.server.port, 9000);
    assert_eq!(store.requests(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_resolution() {
    let dir = config_dir(PRODUCTION_DOCUMENT);
    let store = Arc::new(FakeSecretStore::filled("secret"));
    let registry = Arc::new(registry(&dir, EnvSnapshot::default(), Arc::clone(&store)));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_or_initialize().await })
        })
        .collect();

    let mut resolved = Vec::new();
    for handle in handles {
        resolved.push(handle.await.unwrap().unwrap());
    }

    assert!(resolved.iter().all(|config| Arc::ptr_eq(config, &resolved[0])));
    assert_eq!(store.requests(), distinct_secrets());
    assert_eq!(registry.suffix_for_tracing(), "-prod");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_failure() {
    let dir = config_dir(PRODUCTION_DOCUMENT);
    let store = Arc::new(FakeSecretStore::with(&[(PORTA_API_KEY, "porta")]));
    let registry = Arc::new(registry(&dir, EnvSnapshot::default(), Arc::clone(&store)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_or_initialize().await })
        })
        .collect();

    let mut errors = Vec::new();
    for handle in handles {
        errors.push(handle.await.unwrap().unwrap_err());
    }

    assert!(matches!(errors[0], ConfigError::SecretFetch { .. }));
    assert!(errors.iter().all(|err| err == &errors[0]));
    assert!(registry.get().is_none());
    assert_eq!(registry.suffix_for_tracing(), "");

    let requests = store.requests();
    assert!(registry.get_or_initialize().await.is_err());
    assert_eq!(store.requests(), requests);
}

#[tokio::test]
async fn test_local_environment_never_builds_store() {
    let dir = config_dir(PRODUCTION_DOCUMENT);
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let registry = ConfigRegistry::builder(ConfigLoader::new(dir.path()))
        .env(EnvSnapshot::default())
        .option(override_env("local"))
        .secret_store_factory(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(SecretStoreError::Authentication("no credentials".to_string()))
        })
        .build();

    let config = registry.get_or_initialize().await.unwrap();

    assert_eq!(config.database.flip_db_master.password, "from-document");
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_construction_failure_is_init_error() {
    let dir = config_dir(PRODUCTION_DOCUMENT);
    let registry = ConfigRegistry::builder(ConfigLoader::new(dir.path()))
        .env(EnvSnapshot::default())
        .secret_store_factory(|_, _| {
            Err(SecretStoreError::Authentication("no credentials".to_string()))
        })
        .build();

    let err = registry.get_or_initialize().await.unwrap_err();

    assert!(matches!(err, ConfigError::SecretStoreInit(ref reason) if reason.contains("no credentials")));
}

#[tokio::test]
async fn test_missing_project_id_is_init_error() {
    let dir = config_dir("app:\n  env: staging\nserver:\n  port: 8080\n");
    let store = Arc::new(FakeSecretStore::filled("secret"));

    let err = registry(&dir, EnvSnapshot::default(), Arc::clone(&store))
        .get_or_initialize()
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::SecretStoreInit(_)));
    assert_eq!(store.requests(), 0);
}

#[tokio::test]
async fn test_project_option_feeds_secret_lookup() {
    let dir = config_dir("app:\n  env: staging\nserver:\n  port: 8080\n");
    let store: Arc<dyn SecretStore> = Arc::new(FakeSecretStore::filled("secret"));
    let registry = ConfigRegistry::builder(ConfigLoader::new(dir.path()))
        .env(EnvSnapshot::default())
        .option(override_project_id("flip-staging"))
        .secret_store(store)
        .build();

    let config = registry.get_or_initialize().await.unwrap();

    assert_eq!(config.gcloud.project_id, "flip-staging");
    assert_eq!(config.porta_api_key(), "secret");
}

#[tokio::test]
async fn test_invalid_document_value_is_reported() {
    let dir = config_dir("server:\n  port: not-a-port\n");
    let registry = registry(&dir, EnvSnapshot::default(), Arc::new(FakeSecretStore::default()));

    let err = registry.get_or_initialize().await.unwrap_err();

    assert!(matches!(err, ConfigError::Unmarshal { .. }));
}

#[tokio::test]
async fn test_zero_port_fails_validation() {
    let dir = config_dir("app:\n  env: local\nserver:\n  port: 0\n");
    let registry = registry(&dir, EnvSnapshot::default(), Arc::new(FakeSecretStore::default()));

    let err = registry.get_or_initialize().await.unwrap_err();

    assert!(matches!(err, ConfigError::Validation(_)));
}
