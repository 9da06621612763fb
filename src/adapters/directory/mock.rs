//! Deterministic in-process directory for local development.

use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    application::use_cases::directory::{
        DirectoryConnector, DirectoryPort, OrgAdminStatus, RoleBindings,
    },
    domain::entities::{
        email::is_email_address,
        modules::UsersModule,
        query::{SortOrder, UserBody, UserV1Query, UserV3Query, UsersByBody},
        user::{User, Users},
    },
};

const MOCK_DOMAIN: &str = "mocked.biz";
const ROSTER_SIZE: usize = 5;

fn roster_user(org_id: &str, n: usize) -> User {
    let username = format!("user{n}");
    User {
        id: format!("{org_id}-{n}"),
        email: format!("{username}@{MOCK_DOMAIN}"),
        first_name: "Mock".to_string(),
        last_name: format!("User{n}"),
        username,
        address_string: String::new(),
        is_active: true,
        is_internal: false,
        locale: "en_US".to_string(),
        org_id: org_id.to_string(),
        display_name: format!("Mock Org {org_id}"),
        user_type: "User".to_string(),
        is_org_admin: false,
    }
}

fn roster(org_id: &str) -> Vec<User> {
    (1..=ROSTER_SIZE).map(|n| roster_user(org_id, n)).collect()
}

fn matches_filter(user: &User, filter: &UsersByBody) -> bool {
    (filter.primary_email.is_empty() || user.email == filter.primary_email)
        && (filter.email_starts_with.is_empty() || user.email.starts_with(&filter.email_starts_with))
        && (filter.principal_starts_with.is_empty()
            || user.username.starts_with(&filter.principal_starts_with))
}

/// Sorts by username, then applies offset/limit; the count is taken before paging.
fn page(mut users: Vec<User>, query: &UserV3Query) -> Users {
    users.sort_by(|a, b| a.username.cmp(&b.username));
    if query.sort_order == SortOrder::Desc {
        users.reverse();
    }

    let total = users.len();
    let users = users
        .into_iter()
        .skip(query.offset as usize)
        .take(query.limit as usize)
        .collect();
    Users::new(users, total)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockDirectory;

#[async_trait]
impl DirectoryConnector for MockDirectory {
    fn module(&self) -> UsersModule {
        UsersModule::Mock
    }

    async fn connect(&self) -> AppResult<Box<dyn DirectoryPort>> {
        Ok(Box::new(MockDirectory))
    }
}

#[async_trait]
impl DirectoryPort for MockDirectory {
    fn module(&self) -> UsersModule {
        UsersModule::Mock
    }

    async fn users_by_usernames(&self, body: &UserBody, _query: &UserV1Query) -> AppResult<Users> {
        let users: Vec<User> = body
            .users
            .iter()
            .filter(|name| !is_email_address(name))
            .map(|name| User {
                id: name.clone(),
                username: name.clone(),
                email: format!("{name}@{MOCK_DOMAIN}"),
                is_active: true,
                locale: "en_US".to_string(),
                user_type: "User".to_string(),
                ..Default::default()
            })
            .collect();
        let count = users.len();
        Ok(Users::new(users, count))
    }

    async fn account_users(&self, org_id: &str, query: &UserV3Query) -> AppResult<Users> {
        Ok(page(roster(org_id), query))
    }

    async fn account_users_by(
        &self,
        org_id: &str,
        query: &UserV3Query,
        filter: &UsersByBody,
    ) -> AppResult<Users> {
        let matching = roster(org_id)
            .into_iter()
            .filter(|user| matches_filter(user, filter))
            .collect();
        Ok(page(matching, query))
    }

    /// `user1` is the only org admin in every org.
    async fn admin_status(&self, users: &[User]) -> AppResult<Option<RoleBindings>> {
        Ok(Some(
            users
                .iter()
                .filter(|user| user.username == "user1")
                .map(|user| (user.id.clone(), OrgAdminStatus { is_org_admin: true }))
                .collect(),
        ))
    }
}
