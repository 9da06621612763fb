use serde::{Deserialize, Serialize};

/// Decoded `x-rh-identity` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XRhIdentity {
    #[serde(default)]
    pub identity: Identity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub org_id: String,
    #[serde(rename = "type", default)]
    pub identity_type: String,
    #[serde(default)]
    pub user: IdentityUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_org_admin: bool,
}

impl Identity {
    pub fn is_org_admin(&self) -> bool {
        self.user.is_org_admin
    }
}
