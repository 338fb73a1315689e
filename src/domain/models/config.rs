use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value of `app.env` under which the secret store is never consulted.
pub const LOCAL_ENV: &str = "local";

/// Default Google Secret Manager endpoint.
pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com";

/// Process configuration resolved once at startup.
///
/// Serialized key names are camelCase; documents may spell them in any case
/// (`FlipDBMaster`, `flipdbmaster` and `flipDbMaster` all address the same
/// section). The environment variable for a leaf is its dotted path with
/// `.` replaced by `_`, uppercased: `database.flipDbMaster.password` is
/// overridden by `DATABASE_FLIPDBMASTER_PASSWORD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub app: AppConfiguration,
    pub server: ServerConfiguration,
    pub database: DatabaseConfiguration,
    pub redis: RedisConfiguration,
    pub sentry: SentryConfiguration,
    pub external_api: ExternalApiConfiguration,
    pub api_key: ApiKeyConfiguration,
    pub gcloud: GCloudConfiguration,
    pub consumers: ConsumerConfigs,
    pub publishers: PublisherConfigs,
    pub cron: CronConfiguration,
    pub comm_service: CommServiceConfiguration,
    pub squadcast_service: SquadcastServiceConfiguration,
    pub help_center_service: HelpCenterServiceConfiguration,
}

/// Application-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfiguration {
    /// Deployment environment discriminator (`local`, `staging`, ...)
    pub env: String,
    pub db_debug: bool,
    pub api_prefix: String,
    pub api_key: String,
    /// Appended to tracing span names
    pub suffix_for_tracing: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfiguration {
    pub port: u16,
}

/// Connection settings for every database the service talks to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseConfiguration {
    pub master_payment: DbConfig,
    pub slave_payment: DbConfig,
    pub flip_db_master: DbConfig,
    pub flip_db_slave: DbConfig,
}

/// A single database connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub debug: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedisConfiguration {
    pub pay_redis: RedisConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedisConfig {
    pub address: String,
    pub password: String,
    pub db: i64,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SentryConfiguration {
    /// Sentry is disabled when no DSN is configured
    pub dsn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalApiConfiguration {
    pub porta: CommonExternalApi,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonExternalApi {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiKeyConfiguration {
    pub flip_server: String,
    pub general: String,
}

/// Google Cloud settings, including where secrets are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GCloudConfiguration {
    pub project_id: String,
    pub secret_manager_url: String,
}

impl Default for GCloudConfiguration {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            secret_manager_url: DEFAULT_SECRET_MANAGER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumerConfigs {
    pub enable: bool,
    pub decision_session: ConsumerConfig,
    pub decision_transaction: ConsumerConfig,
}

/// Pub/Sub subscription consumer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumerConfig {
    pub topic: String,
    pub subscription: String,
    pub max_outstanding_messages: i64,
    pub num_goroutines: i64,
    pub toggle: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublisherConfigs {
    pub decision_session: PublisherConfig,
    pub decision_transaction: PublisherConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublisherConfig {
    pub topic: String,
    pub toggle: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CronConfiguration {
    pub blacklist_device: CronJob,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CronJob {
    pub toggle: bool,
    /// Cron expression or Go-style duration, interpreted by the scheduler
    pub interval: String,
    pub limit: i64,
}

/// Outbound e-mail service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommServiceConfiguration {
    pub username: String,
    pub password: String,
    pub sender_mail: String,
    pub cs_email: String,
    pub url: String,
    pub proxy_url: String,
}

/// Squadcast incident reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SquadcastServiceConfiguration {
    pub refresh_token: String,
    pub page_id: i64,
    pub state_id: BTreeMap<String, i64>,
    pub status_id: BTreeMap<String, i64>,
    pub component_id: BTreeMap<String, BTreeMap<String, i64>>,
    pub get_access_token_url: String,
    pub create_issue_url: String,
    pub resolve_issue_url: String,
    pub create_issue_message: String,
    pub resolve_issue_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelpCenterServiceConfiguration {
    pub base_url: String,
    pub token: String,
}

impl Configuration {
    /// True when running on a developer machine without secret-store access.
    pub fn is_local(&self) -> bool {
        self.app.env == LOCAL_ENV
    }

    pub fn env(&self) -> &str {
        &self.app.env
    }

    pub fn suffix_for_tracing(&self) -> &str {
        &self.app.suffix_for_tracing
    }

    /// Username and password for the comm service, in that order.
    pub fn comm_service_auth(&self) -> (&str, &str) {
        (&self.comm_service.username, &self.comm_service.password)
    }

    pub fn comm_sender_mail(&self) -> &str {
        &self.comm_service.sender_mail
    }

    pub fn cs_email(&self) -> &str {
        &self.comm_service.cs_email
    }

    pub fn comm_service_url(&self) -> &str {
        &self.comm_service.url
    }

    pub fn comm_service_proxy_url(&self) -> &str {
        &self.comm_service.proxy_url
    }

    pub fn squadcast_refresh_token(&self) -> &str {
        &self.squadcast_service.refresh_token
    }

    pub const fn squadcast_page_id(&self) -> i64 {
        self.squadcast_service.page_id
    }

    pub const fn squadcast_state_ids(&self) -> &BTreeMap<String, i64> {
        &self.squadcast_service.state_id
    }

    pub const fn squadcast_status_ids(&self) -> &BTreeMap<String, i64> {
        &self.squadcast_service.status_id
    }

    pub const fn squadcast_component_ids(&self) -> &BTreeMap<String, BTreeMap<String, i64>> {
        &self.squadcast_service.component_id
    }

    pub fn squadcast_access_token_url(&self) -> &str {
        &self.squadcast_service.get_access_token_url
    }

    pub fn squadcast_create_issue_url(&self) -> &str {
        &self.squadcast_service.create_issue_url
    }

    pub fn squadcast_resolve_issue_url(&self) -> &str {
        &self.squadcast_service.resolve_issue_url
    }

    pub fn squadcast_create_issue_message(&self) -> &str {
        &self.squadcast_service.create_issue_message
    }

    pub fn squadcast_resolve_issue_message(&self) -> &str {
        &self.squadcast_service.resolve_issue_message
    }

    pub fn help_center_base_url(&self) -> &str {
        &self.help_center_service.base_url
    }

    pub fn help_center_token(&self) -> &str {
        &self.help_center_service.token
    }

    pub fn porta_api_key(&self) -> &str {
        &self.external_api.porta.api_key
    }
}
