//! Static bindings between configuration fields and secret-store entries.

use super::config::Configuration;

pub const FLIP_DB_USER: &str = "flip-db-user";
pub const FLIP_DB_PASSWORD: &str = "flip-db-password";
pub const PAY_DB_USER: &str = "pay-db-user";
pub const PAY_DB_PASSWORD: &str = "pay-db-password";
pub const PORTA_API_KEY: &str = "porta-api-key";
pub const COMM_SERVICE_USERNAME: &str = "comm-service-username";
pub const COMM_SERVICE_PASSWORD: &str = "comm-service-password";
pub const SQUADCAST_SERVICE_REFRESH_TOKEN: &str = "squadcast-service-refresh-token";
pub const HELP_CENTER_TOKEN: &str = "help-center-token";

/// A configuration field whose value must come from the secret store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretField {
    FlipDbMasterUser,
    FlipDbMasterPassword,
    FlipDbSlaveUser,
    FlipDbSlavePassword,
    MasterPaymentUser,
    MasterPaymentPassword,
    SlavePaymentUser,
    SlavePaymentPassword,
    PortaApiKey,
    CommServiceUsername,
    CommServicePassword,
    SquadcastRefreshToken,
    HelpCenterToken,
}

impl SecretField {
    /// Dotted key path of the field, as used in documents.
    pub const fn path(self) -> &'static str {
        match self {
            Self::FlipDbMasterUser => "database.flipDbMaster.user",
            Self::FlipDbMasterPassword => "database.flipDbMaster.password",
            Self::FlipDbSlaveUser => "database.flipDbSlave.user",
            Self::FlipDbSlavePassword => "database.flipDbSlave.password",
            Self::MasterPaymentUser => "database.masterPayment.user",
            Self::MasterPaymentPassword => "database.masterPayment.password",
            Self::SlavePaymentUser => "database.slavePayment.user",
            Self::SlavePaymentPassword => "database.slavePayment.password",
            Self::PortaApiKey => "externalApi.porta.apiKey",
            Self::CommServiceUsername => "commService.username",
            Self::CommServicePassword => "commService.password",
            Self::SquadcastRefreshToken => "squadcastService.refreshToken",
            Self::HelpCenterToken => "helpCenterService.token",
        }
    }

    /// Mutable slot for this field inside `config`.
    pub fn slot(self, config: &mut Configuration) -> &mut String {
        match self {
            Self::FlipDbMasterUser => &mut config.database.flip_db_master.user,
            Self::FlipDbMasterPassword => &mut config.database.flip_db_master.password,
            Self::FlipDbSlaveUser => &mut config.database.flip_db_slave.user,
            Self::FlipDbSlavePassword => &mut config.database.flip_db_slave.password,
            Self::MasterPaymentUser => &mut config.database.master_payment.user,
            Self::MasterPaymentPassword => &mut config.database.master_payment.password,
            Self::SlavePaymentUser => &mut config.database.slave_payment.user,
            Self::SlavePaymentPassword => &mut config.database.slave_payment.password,
            Self::PortaApiKey => &mut config.external_api.porta.api_key,
            Self::CommServiceUsername => &mut config.comm_service.username,
            Self::CommServicePassword => &mut config.comm_service.password,
            Self::SquadcastRefreshToken => &mut config.squadcast_service.refresh_token,
            Self::HelpCenterToken => &mut config.help_center_service.token,
        }
    }
}

/// Pairing of a field with the secret that supplies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretBinding {
    pub field: SecretField,
    pub secret: &'static str,
}

impl SecretBinding {
    pub const fn new(field: SecretField, secret: &'static str) -> Self {
        Self { field, secret }
    }
}

/// Every secret-bound field of [`Configuration`].
pub const SECRET_BINDINGS: &[SecretBinding] = &[
    SecretBinding::new(SecretField::FlipDbMasterUser, FLIP_DB_USER),
    SecretBinding::new(SecretField::FlipDbMasterPassword, FLIP_DB_PASSWORD),
    SecretBinding::new(SecretField::FlipDbSlaveUser, FLIP_DB_USER),
    SecretBinding::new(SecretField::FlipDbSlavePassword, FLIP_DB_PASSWORD),
    SecretBinding::new(SecretField::MasterPaymentUser, PAY_DB_USER),
    SecretBinding::new(SecretField::MasterPaymentPassword, PAY_DB_PASSWORD),
    SecretBinding::new(SecretField::SlavePaymentUser, PAY_DB_USER),
    SecretBinding::new(SecretField::SlavePaymentPassword, PAY_DB_PASSWORD),
    SecretBinding::new(SecretField::PortaApiKey, PORTA_API_KEY),
    SecretBinding::new(SecretField::CommServiceUsername, COMM_SERVICE_USERNAME),
    SecretBinding::new(SecretField::CommServicePassword, COMM_SERVICE_PASSWORD),
    SecretBinding::new(
        SecretField::SquadcastRefreshToken,
        SQUADCAST_SERVICE_REFRESH_TOKEN,
    ),
    SecretBinding::new(SecretField::HelpCenterToken, HELP_CENTER_TOKEN),
];

/// Full resource name of the latest version of `secret` in `project_id`.
pub fn latest_version_name(project_id: &str, secret: &str) -> String {
    format!("projects/{project_id}/secrets/{secret}/versions/latest")
}

/// Replace every secret-bound field with a fixed placeholder.
pub fn redact(config: &mut Configuration, placeholder: &str) {
    for binding in SECRET_BINDINGS {
        let slot = binding.field.slot(config);
        if !slot.is_empty() {
            placeholder.clone_into(slot);
        }
    }
}
