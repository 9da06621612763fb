use std::net::SocketAddr;
use std::str::FromStr;

use env_helpers::get_env_default;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    domain::entities::modules::{MailerModule, StoreBackend, UsersModule},
    infra::error::InfraError,
};

/// Managed-accounts client settings; required when `USERS_MODULE=ams`.
#[derive(Clone)]
pub struct AmsConfig {
    pub url: Url,
    pub token_url: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    pub timeout: std::time::Duration,
}

/// Identity-broker settings; required when `USERS_MODULE=keycloak`.
#[derive(Clone)]
pub struct KeycloakConfig {
    pub token_url: Url,
    pub token_username: String,
    pub token_password: SecretString,
    pub token_grant_type: String,
    pub token_client_id: String,
    pub token_timeout: std::time::Duration,
    pub user_service_url: Url,
    pub user_service_timeout: std::time::Duration,
}

#[derive(Clone)]
pub struct TokenConfig {
    pub private_key: SecretString,
    pub kid: String,
    pub ttl: Duration,
}

/// Published JSON Web Key set served by the public-key endpoint.
#[derive(Clone)]
pub struct JwkConfig {
    pub url: Url,
    pub timeout: std::time::Duration,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` leaves the directory endpoints answering 501.
    pub users_module: Option<UsersModule>,
    pub mailer_module: Option<MailerModule>,
    pub from_email: String,
    pub to_email: String,
    pub ams: Option<AmsConfig>,
    pub keycloak: Option<KeycloakConfig>,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub allowlist_enabled: bool,
    /// Header carrying the client address as forwarded by the gateway.
    pub allowlist_header: String,
    pub token: Option<TokenConfig>,
    /// `None` leaves `/v1/jwt` answering 501.
    pub jwk: Option<JwkConfig>,
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8090)));

        let users_module: Option<UsersModule> = optional_enum("USERS_MODULE")?;
        let mailer_module: Option<MailerModule> = optional_enum("MAILER_MODULE")?;
        let store_backend: StoreBackend =
            optional_enum("STORE_BACKEND")?.unwrap_or_default();

        let from_email: String =
            get_env_default("FROM_EMAIL", "no-reply@example.com".to_string());
        let to_email: String = get_env_default("TO_EMAIL", "no-reply@example.com".to_string());

        let ams = match users_module {
            Some(UsersModule::Ams) => Some(AmsConfig {
                url: required_url("AMS_URL")?,
                token_url: required_url("AMS_TOKEN_URL")?,
                client_id: required("AMS_CLIENT_ID")?,
                client_secret: SecretString::from(required("AMS_CLIENT_SECRET")?),
                timeout: seconds(get_env_default("AMS_TIMEOUT_SECS", 30)),
            }),
            _ => None,
        };

        let keycloak = match users_module {
            Some(UsersModule::Keycloak) => {
                let token_base: String = required("KEYCLOAK_TOKEN_URL")?;
                let token_path: String = get_env_default(
                    "KEYCLOAK_TOKEN_PATH",
                    "/auth/realms/master/protocol/openid-connect/token".to_string(),
                );
                Some(KeycloakConfig {
                    token_url: parse_url("KEYCLOAK_TOKEN_URL", &format!("{token_base}{token_path}"))?,
                    token_username: get_env_default("KEYCLOAK_TOKEN_USERNAME", "admin".to_string()),
                    token_password: SecretString::from(required("KEYCLOAK_TOKEN_PASSWORD")?),
                    token_grant_type: get_env_default(
                        "KEYCLOAK_TOKEN_GRANT_TYPE",
                        "password".to_string(),
                    ),
                    token_client_id: get_env_default(
                        "KEYCLOAK_TOKEN_CLIENT_ID",
                        "admin-cli".to_string(),
                    ),
                    token_timeout: seconds(get_env_default("KEYCLOAK_TIMEOUT_SECS", 60)),
                    user_service_url: required_url("KEYCLOAK_USER_SERVICE_URL")?,
                    user_service_timeout: seconds(get_env_default(
                        "KEYCLOAK_USER_SERVICE_TIMEOUT_SECS",
                        60,
                    )),
                })
            }
            _ => None,
        };

        let database_url = match store_backend {
            StoreBackend::Postgres => Some(required("DATABASE_URL")?),
            StoreBackend::Memory => None,
        };

        let allowlist_enabled: bool = get_env_default("ALLOWLIST_ENABLED", false);
        let allowlist_header: String =
            get_env_default("ALLOWLIST_HEADER", "x-forwarded-for".to_string());

        let token = match optional("TOKEN_PRIVATE_KEY") {
            Some(private_key) => Some(TokenConfig {
                private_key: SecretString::from(private_key),
                kid: get_env_default("TOKEN_KID", "directory-gateway".to_string()),
                ttl: Duration::seconds(get_env_default("TOKEN_TTL_SECS", 3600)),
            }),
            None => None,
        };

        let jwk = match optional("JWK_URL") {
            Some(url) => Some(JwkConfig {
                url: parse_url("JWK_URL", &url)?,
                timeout: seconds(get_env_default("JWK_TIMEOUT_SECS", 10)),
            }),
            None => None,
        };

        Ok(Self {
            bind_addr,
            users_module,
            mailer_module,
            from_email,
            to_email,
            ams,
            keycloak,
            store_backend,
            database_url,
            allowlist_enabled,
            allowlist_header,
            token,
            jwk,
            log_file: optional("LOG_FILE"),
        })
    }
}

fn optional(var: &'static str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(var: &'static str) -> Result<String, InfraError> {
    optional(var).ok_or(InfraError::ConfigMissing { var })
}

fn required_url(var: &'static str) -> Result<Url, InfraError> {
    parse_url(var, &required(var)?)
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, InfraError> {
    Url::parse(value).map_err(|_| InfraError::ConfigInvalid {
        var,
        value: value.to_string(),
    })
}

/// Unset or blank is `None`; anything else must name a known variant.
fn optional_enum<T: FromStr>(var: &'static str) -> Result<Option<T>, InfraError> {
    optional(var)
        .map(|value| {
            T::from_str(&value).map_err(|_| InfraError::ConfigInvalid { var, value })
        })
        .transpose()
}

fn seconds(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs)
}
