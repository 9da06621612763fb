//! Managed-accounts (AMS) directory backend.
//!
//! Every request opens its own connection: a client bounded by the configured
//! timeout plus a client-credentials token. Admin status comes from a second
//! role-binding query over the fetched account ids.

use std::ops::RangeInclusive;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::directory::{
        DirectoryConnector, DirectoryPort, OrgAdminStatus, RoleBindings,
    },
    domain::entities::{
        modules::UsersModule,
        query::{SortOrder, UserBody, UserV1Query, UserV3Query, UsersByBody},
        user::{User, Users},
    },
    infra::{config::AmsConfig, http_client::build_client},
};

const ACCOUNTS_PATH: &str = "/api/accounts_mgmt/v1/accounts";
const ROLE_BINDINGS_PATH: &str = "/api/accounts_mgmt/v1/role_bindings";
const ORG_ADMIN_ROLE: &str = "OrganizationAdmin";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct AccountList {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    items: Vec<Account>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Account {
    id: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    organization: Option<Organization>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Organization {
    external_id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RoleBindingList {
    #[serde(default)]
    items: Vec<RoleBinding>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RoleBinding {
    account: Option<ObjectRef>,
    role: Option<ObjectRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectRef {
    id: String,
}

impl From<Account> for User {
    fn from(account: Account) -> Self {
        let organization = account.organization.unwrap_or_default();
        User {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            address_string: String::new(),
            is_active: true,
            is_internal: false,
            locale: "en_US".to_string(),
            org_id: organization.external_id,
            display_name: organization.name,
            user_type: "User".to_string(),
            is_org_admin: false,
        }
    }
}

impl From<AccountList> for Users {
    fn from(list: AccountList) -> Self {
        Users::new(list.items.into_iter().map(User::from).collect(), list.total)
    }
}

// ============================================================================
// Search and paging helpers
// ============================================================================

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Search expression scoping accounts to `org_id`, narrowed by `filter`.
pub(crate) fn account_search(org_id: &str, filter: Option<&UsersByBody>) -> String {
    let mut clauses = vec![format!("organization.external_id={}", quote(org_id))];

    if let Some(filter) = filter {
        if !filter.primary_email.is_empty() {
            clauses.push(format!("email={}", quote(&filter.primary_email)));
        }
        if !filter.email_starts_with.is_empty() {
            clauses.push(format!(
                "email like {}",
                quote(&format!("{}%", filter.email_starts_with))
            ));
        }
        if !filter.principal_starts_with.is_empty() {
            clauses.push(format!(
                "username like {}",
                quote(&format!("{}%", filter.principal_starts_with))
            ));
        }
    }

    clauses.join(" and ")
}

fn in_list<'a>(field: &str, values: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = values.into_iter().map(quote).collect();
    format!("{field} in ({})", quoted.join(","))
}

/// Pages of `limit` rows that cover `offset..offset + limit`, and how many
/// leading rows of the first page fall before `offset`.
pub(crate) fn covering_pages(query: &UserV3Query) -> (RangeInclusive<u32>, usize) {
    let size = query.limit.max(1);
    let first = query.offset / size + 1;
    let skip = query.offset % size;
    let last = if skip == 0 { first } else { first + 1 };
    (first..=last, skip as usize)
}

/// `search`, `size`, `page` and `orderBy` for one page of an account listing.
pub(crate) fn account_params(
    search: &str,
    query: &UserV3Query,
    page: u32,
) -> Vec<(&'static str, String)> {
    vec![
        ("search", search.to_string()),
        ("size", query.limit.max(1).to_string()),
        ("page", page.to_string()),
        ("orderBy", format!("username {}", query.sort_order)),
    ]
}

pub(crate) fn role_binding_search(ids: &[&str]) -> String {
    format!(
        "{} and role.id={}",
        in_list("account.id", ids.iter().copied()),
        quote(ORG_ADMIN_ROLE)
    )
}

// ============================================================================
// Connector / connection
// ============================================================================

pub struct AmsConnector {
    config: AmsConfig,
}

impl AmsConnector {
    pub fn new(config: AmsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DirectoryConnector for AmsConnector {
    fn module(&self) -> UsersModule {
        UsersModule::Ams
    }

    async fn connect(&self) -> AppResult<Box<dyn DirectoryPort>> {
        let client = build_client(self.config.timeout)
            .map_err(|e| AppError::Upstream(format!("failed to build AMS client: {e}")))?;

        let response = client
            .post(self.config.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("error fetching AMS token: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "AMS token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("error decoding AMS token: {e}")))?;

        tracing::debug!("Opened AMS connection");
        Ok(Box::new(AmsConnection {
            client,
            base_url: self.config.url.clone(),
            token: SecretString::from(token.access_token),
        }))
    }
}

struct AmsConnection {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl AmsConnection {
    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Upstream(format!("invalid AMS url: {e}")))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .bearer_auth(self.token.expose_secret())
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("error calling AMS {path}: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "AMS {path} returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("error decoding AMS {path} response: {e}")))
    }

    async fn accounts(&self, search: String, query: &UserV3Query) -> AppResult<Users> {
        let (pages, skip) = covering_pages(query);
        let limit = query.limit.max(1) as usize;

        let mut total = 0;
        let mut items = Vec::new();
        for page in pages {
            let list: AccountList = self
                .get(ACCOUNTS_PATH, &account_params(&search, query, page))
                .await?;
            if items.is_empty() {
                total = list.total;
            }
            let last_page = list.items.len() < limit;
            items.extend(list.items);
            if last_page {
                break;
            }
        }

        let users = items
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(User::from)
            .collect();
        Ok(Users::new(users, total))
    }
}

impl Drop for AmsConnection {
    fn drop(&mut self) {
        tracing::debug!("Released AMS connection");
    }
}

#[async_trait]
impl DirectoryPort for AmsConnection {
    fn module(&self) -> UsersModule {
        UsersModule::Ams
    }

    async fn users_by_usernames(&self, body: &UserBody, query: &UserV1Query) -> AppResult<Users> {
        let order_by = format!(
            "{} {}",
            query.query_by.as_deref().unwrap_or("username"),
            query.sort_order.unwrap_or(SortOrder::Asc)
        );
        let params = [
            (
                "search",
                in_list("username", body.users.iter().map(String::as_str)),
            ),
            ("size", body.users.len().max(1).to_string()),
            ("page", "1".to_string()),
            ("orderBy", order_by),
        ];

        let list: AccountList = self.get(ACCOUNTS_PATH, &params).await?;
        Ok(list.into())
    }

    async fn account_users(&self, org_id: &str, query: &UserV3Query) -> AppResult<Users> {
        self.accounts(account_search(org_id, None), query).await
    }

    async fn account_users_by(
        &self,
        org_id: &str,
        query: &UserV3Query,
        filter: &UsersByBody,
    ) -> AppResult<Users> {
        self.accounts(account_search(org_id, Some(filter)), query)
            .await
    }

    async fn admin_status(&self, users: &[User]) -> AppResult<Option<RoleBindings>> {
        if users.is_empty() {
            return Ok(Some(RoleBindings::new()));
        }

        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        let params = [
            ("search", role_binding_search(&ids)),
            ("size", ids.len().to_string()),
        ];
        let list: RoleBindingList = self.get(ROLE_BINDINGS_PATH, &params).await?;

        let bindings = list
            .items
            .into_iter()
            .filter_map(|binding| {
                let account = binding.account?;
                let is_org_admin = binding.role.is_some_and(|role| role.id == ORG_ADMIN_ROLE);
                Some((account.id, OrgAdminStatus { is_org_admin }))
            })
            .collect();

        Ok(Some(bindings))
    }
}
