use serde::{Deserialize, Serialize};

/// Canonical directory user, independent of the backend it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub address_string: String,
    pub is_active: bool,
    pub is_internal: bool,
    pub locale: String,
    pub org_id: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub is_org_admin: bool,
}

/// A page of users plus the total the backend reported for the query.
///
/// `user_count` is the server-side match count. Local filtering changes the
/// length of `users` but never touches `user_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Users {
    pub user_count: usize,
    pub users: Vec<User>,
}

impl Users {
    pub fn new(users: Vec<User>, user_count: usize) -> Self {
        Self { user_count, users }
    }

    pub fn add_user(&mut self, user: User) {
        self.users.push(user);
    }

    /// Removes the user at `index`, keeping the others in order.
    pub fn remove_user(&mut self, index: usize) {
        self.users = std::mem::take(&mut self.users)
            .into_iter()
            .enumerate()
            .filter_map(|(i, user)| (i != index).then_some(user))
            .collect();
    }

    pub fn remove_non_org_admins(&mut self) {
        self.retain_users(|user| user.is_org_admin);
    }

    /// Rebuilds the sequence from the users matching `keep`.
    pub fn retain_users(&mut self, mut keep: impl FnMut(&User) -> bool) {
        self.users = std::mem::take(&mut self.users)
            .into_iter()
            .filter(|user| keep(user))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
