use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Org scope whose allowlist blocks apply to every organization.
pub const SYSTEM_ORG_ID: &str = "system";

/// A satellite registered against an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub org_id: String,
    pub username: String,
    pub uid: String,
    pub display_name: String,
    pub extra: Option<serde_json::Map<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a registration; the store assigns id and timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRegistration {
    pub org_id: String,
    pub username: String,
    pub uid: String,
    pub display_name: String,
    pub extra: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationUpdate {
    pub extra: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A CIDR block allowed to register satellites for an org.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowlistBlock {
    pub ip_block: String,
    pub org_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl AllowlistBlock {
    pub fn new(ip_block: impl Into<String>, org_id: impl Into<String>) -> Self {
        Self {
            ip_block: ip_block.into(),
            org_id: org_id.into(),
            created_at: None,
        }
    }
}
