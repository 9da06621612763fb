use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Sort direction accepted by the directory endpoints.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Paging and filtering options for the account-scoped (v3) endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserV3Query {
    pub limit: u32,
    pub offset: u32,
    pub sort_order: SortOrder,
    pub admin_only: bool,
}

impl UserV3Query {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 1000;
}

impl Default for UserV3Query {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
            sort_order: SortOrder::Asc,
            admin_only: false,
        }
    }
}

/// Ordering options for the by-username (v1) lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserV1Query {
    pub query_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

/// Usernames to look up in one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBody {
    #[serde(default)]
    pub users: Vec<String>,
}

/// Free-text filter for the `usersBy` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsersByBody {
    #[serde(alias = "primary_email")]
    pub primary_email: String,
    #[serde(alias = "email_starts_with")]
    pub email_starts_with: String,
    #[serde(alias = "principal_starts_with")]
    pub principal_starts_with: String,
}

impl UsersByBody {
    /// True when no filter field is set.
    pub fn is_empty(&self) -> bool {
        self.primary_email.is_empty()
            && self.email_starts_with.is_empty()
            && self.principal_starts_with.is_empty()
    }
}
