use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        identity::Identity,
        registration::{AllowlistBlock, NewRegistration, Registration, RegistrationUpdate},
    },
};

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// One page of an org's registrations, newest first, plus the org total.
    async fn all(
        &self,
        org_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Registration>, i64)>;

    async fn find(&self, org_id: &str, uid: &str) -> AppResult<Registration>;

    async fn find_by_uid(&self, uid: &str) -> AppResult<Registration>;

    /// Fails with `AlreadyExists` on a uniqueness violation.
    async fn create(&self, registration: &NewRegistration) -> AppResult<Uuid>;

    async fn update(&self, registration: &Registration, update: &RegistrationUpdate)
    -> AppResult<()>;

    /// Fails with `NotFound` when nothing was deleted.
    async fn delete(&self, org_id: &str, uid: &str) -> AppResult<()>;

    /// Whether `ip` falls in one of the org's blocks or a `system` block.
    async fn allowed_ip(&self, ip: &str, org_id: &str) -> AppResult<bool>;

    async fn allow_address(&self, block: &AllowlistBlock) -> AppResult<()>;

    /// Fails with `NotFound` when the block wasn't allowlisted.
    async fn deny_address(&self, block: &AllowlistBlock) -> AppResult<()>;

    async fn allowed_addresses(&self, org_id: &str) -> AppResult<Vec<AllowlistBlock>>;
}

/// Checks `ip` against every block. A malformed block is an error; an
/// unparsable client address is simply not allowed.
pub fn ip_in_blocks<'a>(ip: &str, blocks: impl IntoIterator<Item = &'a str>) -> AppResult<bool> {
    let Ok(addr) = ip.trim().parse::<IpAddr>() else {
        return Ok(false);
    };

    for block in blocks {
        let network = block
            .parse::<IpNetwork>()
            .map_err(|e| AppError::Internal(format!("invalid allowlist block {block}: {e}")))?;
        if network.contains(addr) {
            return Ok(true);
        }
    }

    Ok(false)
}

// ============================================================================
// Use Cases
// ============================================================================

/// Create request body; both fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub uid: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Clone)]
pub struct RegistrationUseCases {
    store: Arc<dyn RegistrationStore>,
    allowlist_enabled: bool,
}

impl RegistrationUseCases {
    pub fn new(store: Arc<dyn RegistrationStore>, allowlist_enabled: bool) -> Self {
        Self {
            store,
            allowlist_enabled,
        }
    }

    #[instrument(skip(self, identity), fields(org_id = %identity.org_id))]
    pub async fn list(
        &self,
        identity: &Identity,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Registration>, i64)> {
        require_org_admin(identity, "user must be org admin to list registrations")?;
        self.store.all(&identity.org_id, limit, offset).await
    }

    /// Register a satellite for the caller's org.
    ///
    /// `client_ip` is the forwarded client address, `cert_cn` the raw
    /// certificate common-name header set by the gateway. The JSON `body` is
    /// only decoded once the address has passed the allowlist.
    #[instrument(skip(self, identity, body), fields(org_id = %identity.org_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        client_ip: Option<&str>,
        cert_cn: Option<&str>,
        body: &[u8],
    ) -> AppResult<Uuid> {
        if self.allowlist_enabled {
            let allowed = self
                .store
                .allowed_ip(client_ip.unwrap_or_default(), &identity.org_id)
                .await?;
            if !allowed {
                return Err(AppError::Forbidden("address is not allowlisted".into()));
            }
        }

        let request: RegistrationRequest = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("invalid request body: {e}")))?;

        let uid = request
            .uid
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| AppError::InvalidInput("required parameter [uid] not found in body".into()))?;
        let display_name = request
            .display_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                AppError::InvalidInput("required parameter [display_name] not found in body".into())
            })?;

        require_org_admin(identity, "user must be org admin to register satellite")?;
        if identity.user.username.is_empty() {
            return Err(AppError::InvalidInput(
                "[username] not present in identity header".into(),
            ));
        }

        let gateway_cn = parse_cert_cn(cert_cn)?;
        if gateway_cn != uid {
            return Err(AppError::InvalidInput(
                "x-rh-certauth-cn does not match uid".into(),
            ));
        }

        let id = self
            .store
            .create(&NewRegistration {
                org_id: identity.org_id.clone(),
                username: identity.user.username.clone(),
                uid,
                display_name,
                extra: None,
            })
            .await?;

        tracing::info!(%id, username = %identity.user.username, "Created registration");
        Ok(id)
    }

    #[instrument(skip(self, identity), fields(org_id = %identity.org_id))]
    pub async fn delete(&self, identity: &Identity, uid: &str) -> AppResult<()> {
        if uid.is_empty() {
            return Err(AppError::InvalidInput("invalid uid passed in path".into()));
        }
        require_org_admin(identity, "user must be org admin to delete registrations")?;

        self.store.delete(&identity.org_id, uid).await?;
        tracing::info!(uid, "Deleted registration");
        Ok(())
    }

    pub async fn allowed_addresses(&self, identity: &Identity) -> AppResult<Vec<AllowlistBlock>> {
        require_org_admin(identity, "user must be org admin to list allowlisted addresses")?;
        self.store.allowed_addresses(&identity.org_id).await
    }

    #[instrument(skip(self, identity), fields(org_id = %identity.org_id))]
    pub async fn allow_address(&self, identity: &Identity, ip_block: &str) -> AppResult<()> {
        require_org_admin(identity, "user must be org admin to allowlist addresses")?;
        let block = validated_block(ip_block, &identity.org_id)?;
        self.store.allow_address(&block).await
    }

    #[instrument(skip(self, identity), fields(org_id = %identity.org_id))]
    pub async fn deny_address(&self, identity: &Identity, ip_block: &str) -> AppResult<()> {
        require_org_admin(identity, "user must be org admin to remove allowlisted addresses")?;
        let block = validated_block(ip_block, &identity.org_id)?;
        self.store.deny_address(&block).await
    }
}

fn require_org_admin(identity: &Identity, message: &str) -> AppResult<()> {
    if !identity.is_org_admin() {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

fn validated_block(ip_block: &str, org_id: &str) -> AppResult<AllowlistBlock> {
    let ip_block = ip_block.trim();
    ip_block
        .parse::<IpNetwork>()
        .map_err(|e| AppError::InvalidInput(format!("invalid ip block {ip_block}: {e}")))?;
    Ok(AllowlistBlock::new(ip_block, org_id))
}

/// Extracts the common name from the gateway's certificate header.
///
/// Accepts either a bare CN or a subject string such as `/O=org/CN=uid`.
pub fn parse_cert_cn(header: Option<&str>) -> AppResult<String> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::InvalidInput("[x-rh-certauth-cn] header not present".into()))?;

    let cn = match header.rfind("CN=") {
        Some(pos) => header[pos + 3..]
            .split(['/', ','])
            .next()
            .unwrap_or_default()
            .trim(),
        None => header,
    };

    if cn.is_empty() {
        return Err(AppError::InvalidInput(
            "invalid [x-rh-certauth-cn] header".into(),
        ));
    }
    Ok(cn.to_string())
}
