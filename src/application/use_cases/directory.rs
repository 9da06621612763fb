use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        modules::UsersModule,
        query::{UserBody, UserV1Query, UserV3Query, UsersByBody},
        user::{User, Users},
    },
};

// ============================================================================
// Ports
// ============================================================================

/// Admin flag reported by a role-binding lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgAdminStatus {
    pub is_org_admin: bool,
}

/// User id -> admin status, covering only users the backend had a binding for.
pub type RoleBindings = HashMap<String, OrgAdminStatus>;

/// A live, request-scoped session against one directory backend.
///
/// Implementations own whatever credentials and clients they opened in
/// [`DirectoryConnector::connect`] and release them when dropped.
#[async_trait]
pub trait DirectoryPort: Send + Sync {
    fn module(&self) -> UsersModule;

    async fn users_by_usernames(&self, body: &UserBody, query: &UserV1Query) -> AppResult<Users>;

    async fn account_users(&self, org_id: &str, query: &UserV3Query) -> AppResult<Users>;

    async fn account_users_by(
        &self,
        org_id: &str,
        query: &UserV3Query,
        filter: &UsersByBody,
    ) -> AppResult<Users>;

    /// Role bindings for exactly `users`, or `None` when the backend already
    /// embeds `is_org_admin` in every user it returns.
    async fn admin_status(&self, users: &[User]) -> AppResult<Option<RoleBindings>>;
}

/// Opens request-scoped sessions against the configured backend.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    fn module(&self) -> UsersModule;

    async fn connect(&self) -> AppResult<Box<dyn DirectoryPort>>;
}

// ============================================================================
// Enrichment, filtering and response shaping
// ============================================================================

/// Copies admin flags from `bindings` onto `users`.
///
/// Users without a binding are not admins; with `admin_only` they are dropped
/// after the flags are applied. `user_count` is left as reported.
pub fn apply_org_admin_status(users: &mut Users, bindings: &RoleBindings, admin_only: bool) {
    for user in users.users.iter_mut() {
        user.is_org_admin = bindings
            .get(&user.id)
            .map(|status| status.is_org_admin)
            .unwrap_or(false);
    }

    if admin_only {
        users.retain_users(|user| bindings.contains_key(&user.id));
    }
}

/// Which endpoint a response is being shaped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryEndpoint {
    AccountUsers,
    AccountUsersBy,
}

/// JSON body of a directory response; the variant decides the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DirectoryResponse {
    List(Vec<User>),
    Single(User),
    Page(Users),
}

/// Picks the response cardinality for `endpoint`.
///
/// The managed-accounts path always answers with a flat list. The identity
/// broker collapses differently per endpoint: the users listing returns a bare
/// list when the reported count is 1, the filtered lookup returns a bare object
/// when exactly one user is left locally. Both rules are relied upon by clients.
pub fn shape_response(
    module: UsersModule,
    endpoint: DirectoryEndpoint,
    users: Users,
) -> DirectoryResponse {
    if module.enriches_admin_status() {
        return DirectoryResponse::List(users.users);
    }

    match endpoint {
        DirectoryEndpoint::AccountUsers if users.user_count == 1 => {
            DirectoryResponse::List(users.users)
        }
        DirectoryEndpoint::AccountUsersBy if users.len() == 1 => {
            let mut users = users;
            match users.users.pop() {
                Some(user) => DirectoryResponse::Single(user),
                None => DirectoryResponse::Page(users),
            }
        }
        _ => DirectoryResponse::Page(users),
    }
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct DirectoryUseCases {
    connector: Option<Arc<dyn DirectoryConnector>>,
}

impl DirectoryUseCases {
    pub fn new(connector: Option<Arc<dyn DirectoryConnector>>) -> Self {
        Self { connector }
    }

    pub fn module(&self) -> Option<UsersModule> {
        self.connector.as_ref().map(|c| c.module())
    }

    /// GET /v3/accounts/{org_id}/users
    #[instrument(skip(self))]
    pub async fn list_account_users(
        &self,
        org_id: &str,
        query: UserV3Query,
    ) -> AppResult<DirectoryResponse> {
        let org_id = require_org_id(org_id, "users")?;
        let port = self.connect().await?;

        let users = port
            .account_users(org_id, &query)
            .await
            .map_err(|e| upstream("Can't retrieve users", e))?;
        let users = apply_admin_pipeline(port.as_ref(), users, &query).await?;

        tracing::debug!(
            org_id,
            user_count = users.user_count,
            returned = users.len(),
            "Listed account users"
        );
        Ok(shape_response(
            port.module(),
            DirectoryEndpoint::AccountUsers,
            users,
        ))
    }

    /// POST /v3/accounts/{org_id}/usersBy
    #[instrument(skip(self))]
    pub async fn find_account_users(
        &self,
        org_id: &str,
        query: UserV3Query,
        filter: UsersByBody,
    ) -> AppResult<DirectoryResponse> {
        let org_id = require_org_id(org_id, "usersBy")?;
        if filter.is_empty() {
            return Err(AppError::InvalidInput(
                "request must include 'primaryEmail', 'emailStartsWith', or 'principalStartsWith'"
                    .into(),
            ));
        }
        let port = self.connect().await?;

        let users = port
            .account_users_by(org_id, &query, &filter)
            .await
            .map_err(|e| upstream("Can't retrieve users", e))?;
        let users = apply_admin_pipeline(port.as_ref(), users, &query).await?;

        Ok(shape_response(
            port.module(),
            DirectoryEndpoint::AccountUsersBy,
            users,
        ))
    }

    /// POST /v1/users
    #[instrument(skip(self))]
    pub async fn users_by_usernames(&self, body: UserBody, query: UserV1Query) -> AppResult<Users> {
        if body.users.is_empty() {
            return Err(AppError::InvalidInput(
                "request must include at least one username in 'users'".into(),
            ));
        }
        let port = self.connect().await?;
        port.users_by_usernames(&body, &query)
            .await
            .map_err(|e| upstream("Can't retrieve users", e))
    }

    async fn connect(&self) -> AppResult<Box<dyn DirectoryPort>> {
        let connector = self
            .connector
            .as_ref()
            .ok_or(AppError::NoDirectoryConfigured)?;
        connector
            .connect()
            .await
            .map_err(|e| upstream("Can't build connection", e))
    }
}

/// Enrich with role bindings when the backend needs it, then apply the
/// admin-only filter. Any failure aborts the whole request.
async fn apply_admin_pipeline(
    port: &dyn DirectoryPort,
    mut users: Users,
    query: &UserV3Query,
) -> AppResult<Users> {
    let bindings = port
        .admin_status(&users.users)
        .await
        .map_err(|e| upstream("Can't retrieve role bindings", e))?;

    match bindings {
        Some(bindings) => apply_org_admin_status(&mut users, &bindings, query.admin_only),
        None if query.admin_only => users.remove_non_org_admins(),
        None => {}
    }

    Ok(users)
}

fn require_org_id<'a>(org_id: &'a str, endpoint: &str) -> AppResult<&'a str> {
    let org_id = org_id.trim();
    if org_id.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Request URL must include orgID: /v3/accounts/{{orgID}}/{endpoint}"
        )));
    }
    Ok(org_id)
}

fn upstream(context: &str, err: AppError) -> AppError {
    match err {
        AppError::Upstream(cause) => AppError::Upstream(format!("{context}: {cause}")),
        other => other,
    }
}
