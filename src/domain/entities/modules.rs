use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Directory backend serving user lookups, chosen once at startup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum UsersModule {
    /// Managed-accounts service; admin status comes from role bindings.
    Ams,
    /// Identity broker; admin status is embedded in each user.
    Keycloak,
    Mock,
}

impl UsersModule {
    /// Whether org-admin status needs a second role-binding lookup.
    pub fn enriches_admin_status(&self) -> bool {
        matches!(self, UsersModule::Ams | UsersModule::Mock)
    }
}

/// Outbound mail transport.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MailerModule {
    Print,
}

/// Where satellite registrations are kept.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}
