//! Scripted directory backend for use-case and route tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::directory::{DirectoryConnector, DirectoryPort, RoleBindings},
    domain::entities::{
        modules::UsersModule,
        query::{UserBody, UserV1Query, UserV3Query, UsersByBody},
        user::{User, Users},
    },
};

/// Returns canned users and records every backend call by name.
///
/// `admin_status` is only recorded for modules that enrich; other modules
/// answer `None` like a backend with embedded admin flags.
#[derive(Clone)]
pub struct StubDirectory {
    pub module: UsersModule,
    pub users: Users,
    pub usernames: Users,
    pub bindings: RoleBindings,
    pub fail_admin_status: bool,
    pub fail_connect: bool,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl StubDirectory {
    pub fn new(module: UsersModule) -> Self {
        Self {
            module,
            users: Users::default(),
            usernames: Users::default(),
            bindings: RoleBindings::new(),
            fail_admin_status: false,
            fail_connect: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Users returned by both account listings.
    pub fn with_users(mut self, users: Users) -> Self {
        self.users = users;
        self
    }

    /// Users returned by the by-usernames lookup.
    pub fn with_usernames(mut self, users: Users) -> Self {
        self.usernames = users;
        self
    }

    pub fn with_bindings(mut self, bindings: RoleBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn failing_admin_status(mut self) -> Self {
        self.fail_admin_status = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DirectoryConnector for StubDirectory {
    fn module(&self) -> UsersModule {
        self.module
    }

    async fn connect(&self) -> AppResult<Box<dyn DirectoryPort>> {
        self.record("connect");
        if self.fail_connect {
            return Err(AppError::Upstream("token endpoint unreachable".into()));
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl DirectoryPort for StubDirectory {
    fn module(&self) -> UsersModule {
        self.module
    }

    async fn users_by_usernames(&self, _body: &UserBody, _query: &UserV1Query) -> AppResult<Users> {
        self.record("users_by_usernames");
        Ok(self.usernames.clone())
    }

    async fn account_users(&self, _org_id: &str, _query: &UserV3Query) -> AppResult<Users> {
        self.record("account_users");
        Ok(self.users.clone())
    }

    async fn account_users_by(
        &self,
        _org_id: &str,
        _query: &UserV3Query,
        _filter: &UsersByBody,
    ) -> AppResult<Users> {
        self.record("account_users_by");
        Ok(self.users.clone())
    }

    async fn admin_status(&self, _users: &[User]) -> AppResult<Option<RoleBindings>> {
        if !self.module.enriches_admin_status() {
            return Ok(None);
        }
        self.record("admin_status");
        if self.fail_admin_status {
            return Err(AppError::Upstream("role bindings unavailable".into()));
        }
        Ok(Some(self.bindings.clone()))
    }
}
