use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::identity::Identity,
};

// ============================================================================
// Identity Token Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub org_id: String,
    pub username: String,
    pub is_org_admin: bool,
}

/// Signs short-lived RS256 tokens describing the caller's identity.
#[derive(Clone)]
pub struct TokenSigner {
    private_key: SecretString,
    kid: String,
}

impl TokenSigner {
    pub fn new(private_key: SecretString, kid: impl Into<String>) -> Self {
        Self {
            private_key,
            kid: kid.into(),
        }
    }

    pub fn create(&self, ttl: Duration, identity: &Identity) -> AppResult<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = IdentityClaims {
            exp: now + ttl.whole_seconds(),
            iat: now,
            nbf: now,
            org_id: identity.org_id.clone(),
            username: identity.user.username.clone(),
            is_org_admin: identity.user.is_org_admin,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());

        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
            .map_err(|e| AppError::Internal(format!("invalid token signing key: {e}")))?;

        encode(&header, &claims, &key).map_err(|e| AppError::Internal(e.to_string()))
    }
}
