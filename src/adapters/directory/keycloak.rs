//! Identity-broker (Keycloak user service) directory backend.
//!
//! The user service embeds `is_org_admin` in every record, so no role-binding
//! lookup is made on this path.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::directory::{DirectoryConnector, DirectoryPort, RoleBindings},
    domain::entities::{
        modules::UsersModule,
        query::{UserBody, UserV1Query, UserV3Query, UsersByBody},
        user::{User, Users},
    },
    infra::{config::KeycloakConfig, http_client::build_client},
};

const BY_USERNAMES_LIMIT: &str = "100";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BrokerResponse {
    meta: BrokerMeta,
    users: Vec<BrokerUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BrokerMeta {
    total: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BrokerUser {
    id: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_active: bool,
    is_internal: bool,
    org_id: String,
    user_id: String,
    #[serde(rename = "type")]
    user_type: String,
    is_org_admin: bool,
}

impl From<BrokerUser> for User {
    fn from(raw: BrokerUser) -> Self {
        User {
            id: raw.id,
            username: raw.username,
            email: raw.email,
            first_name: raw.first_name,
            last_name: raw.last_name,
            address_string: String::new(),
            is_active: raw.is_active,
            is_internal: raw.is_internal,
            locale: "en_US".to_string(),
            org_id: raw.org_id,
            display_name: raw.user_id,
            user_type: raw.user_type,
            is_org_admin: raw.is_org_admin,
        }
    }
}

/// Normalized broker payload, before it is folded into [`Users`].
#[derive(Debug, PartialEq)]
pub(crate) enum BrokerUsers {
    /// Exactly one raw record; the reported total is dropped.
    Single(User),
    Page(Users),
}

impl From<BrokerResponse> for BrokerUsers {
    fn from(mut response: BrokerResponse) -> Self {
        if response.users.len() == 1
            && let Some(user) = response.users.pop()
        {
            return BrokerUsers::Single(user.into());
        }

        BrokerUsers::Page(Users::new(
            response.users.into_iter().map(User::from).collect(),
            response.meta.total,
        ))
    }
}

impl From<BrokerUsers> for Users {
    fn from(users: BrokerUsers) -> Self {
        match users {
            // A lone record counts as one so the listing collapses to an array.
            BrokerUsers::Single(user) => Users::new(vec![user], 1),
            BrokerUsers::Page(users) => users,
        }
    }
}

// ============================================================================
// Query builders
// ============================================================================

fn paging_params(org_id: &str, query: &UserV3Query) -> Vec<(&'static str, String)> {
    vec![
        ("order", "username".to_string()),
        ("direction", query.sort_order.to_string()),
        ("org_id", org_id.to_string()),
        ("limit", query.limit.to_string()),
        ("offset", query.offset.to_string()),
    ]
}

pub(crate) fn account_users_params(org_id: &str, query: &UserV3Query) -> Vec<(&'static str, String)> {
    paging_params(org_id, query)
}

/// Both email filters are sent as repeated `emails` params.
pub(crate) fn account_users_by_params(
    org_id: &str,
    query: &UserV3Query,
    filter: &UsersByBody,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !filter.email_starts_with.is_empty() {
        params.push(("emails", filter.email_starts_with.clone()));
    }
    if !filter.primary_email.is_empty() {
        params.push(("emails", filter.primary_email.clone()));
    }
    if !filter.principal_starts_with.is_empty() {
        params.push(("usernames", filter.principal_starts_with.clone()));
    }
    params.extend(paging_params(org_id, query));
    params
}

pub(crate) fn users_by_usernames_params(
    body: &UserBody,
    query: &UserV1Query,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("limit", BY_USERNAMES_LIMIT.to_string())];
    if let Some(order) = query.query_by.as_deref().filter(|o| !o.is_empty()) {
        params.push(("order", order.to_string()));
    }
    if let Some(direction) = query.sort_order {
        params.push(("direction", direction.to_string()));
    }
    params.push(("usernames", body.users.join(",")));
    params
}

// ============================================================================
// Connector / connection
// ============================================================================

pub struct KeycloakConnector {
    config: KeycloakConfig,
}

impl KeycloakConnector {
    pub fn new(config: KeycloakConfig) -> Self {
        Self { config }
    }

    async fn access_token(&self) -> AppResult<SecretString> {
        let client = build_client(self.config.token_timeout)
            .map_err(|e| AppError::Upstream(format!("failed to build keycloak client: {e}")))?;

        let secret_field = if self.config.token_grant_type == "password" {
            "password"
        } else {
            "client_secret"
        };
        let form = [
            ("username", self.config.token_username.as_str()),
            ("grant_type", self.config.token_grant_type.as_str()),
            ("client_id", self.config.token_client_id.as_str()),
            (secret_field, self.config.token_password.expose_secret()),
        ];

        let response = client
            .post(self.config.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("error fetching keycloak token: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "keycloak token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("error decoding keycloak token: {e}")))?;
        Ok(SecretString::from(token.access_token))
    }
}

#[async_trait]
impl DirectoryConnector for KeycloakConnector {
    fn module(&self) -> UsersModule {
        UsersModule::Keycloak
    }

    async fn connect(&self) -> AppResult<Box<dyn DirectoryPort>> {
        let token = self.access_token().await?;
        let client = build_client(self.config.user_service_timeout).map_err(|e| {
            AppError::Upstream(format!("failed to build user service client: {e}"))
        })?;

        tracing::debug!("Opened keycloak user service connection");
        Ok(Box::new(KeycloakConnection {
            client,
            users_url: users_url(&self.config.user_service_url)?,
            token,
        }))
    }
}

fn users_url(base: &Url) -> AppResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::Upstream(format!("invalid user service url {base}")))?
        .pop_if_empty()
        .push("users");
    Ok(url)
}

struct KeycloakConnection {
    client: Client,
    users_url: Url,
    token: SecretString,
}

impl KeycloakConnection {
    async fn fetch(&self, params: &[(&str, String)]) -> AppResult<BrokerUsers> {
        let response = self
            .client
            .get(self.users_url.clone())
            .bearer_auth(self.token.expose_secret())
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("error calling user service: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "user service returned {}",
                response.status()
            )));
        }

        let body: BrokerResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("error decoding user service response: {e}")))?;
        Ok(body.into())
    }
}

impl Drop for KeycloakConnection {
    fn drop(&mut self) {
        tracing::debug!("Released keycloak user service connection");
    }
}

#[async_trait]
impl DirectoryPort for KeycloakConnection {
    fn module(&self) -> UsersModule {
        UsersModule::Keycloak
    }

    async fn users_by_usernames(&self, body: &UserBody, query: &UserV1Query) -> AppResult<Users> {
        Ok(self
            .fetch(&users_by_usernames_params(body, query))
            .await?
            .into())
    }

    async fn account_users(&self, org_id: &str, query: &UserV3Query) -> AppResult<Users> {
        Ok(self
            .fetch(&account_users_params(org_id, query))
            .await?
            .into())
    }

    async fn account_users_by(
        &self,
        org_id: &str,
        query: &UserV3Query,
        filter: &UsersByBody,
    ) -> AppResult<Users> {
        Ok(self
            .fetch(&account_users_by_params(org_id, query, filter))
            .await?
            .into())
    }

    async fn admin_status(&self, _users: &[User]) -> AppResult<Option<RoleBindings>> {
        Ok(None)
    }
}
