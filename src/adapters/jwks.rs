//! Client for the published JSON Web Key set.

use crate::{
    app_error::{AppError, AppResult},
    application::jwk::JwkSet,
    infra::{config::JwkConfig, http_client::build_client},
};

pub struct JwksClient {
    config: JwkConfig,
}

impl JwksClient {
    pub fn new(config: JwkConfig) -> Self {
        Self { config }
    }

    /// Fetches the key set on every call, so rotated keys show up at once.
    pub async fn key_set(&self) -> AppResult<JwkSet> {
        let client = build_client(self.config.timeout)
            .map_err(|e| AppError::Upstream(format!("failed to build JWK client: {e}")))?;

        let response = client
            .get(self.config.url.clone())
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("error getting JWKs: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "JWK endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(format!("error reading JWKs: {e}")))?;

        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidInput(format!("failed to parse response: {e}")))
    }

    pub async fn public_key_pem(&self, kid: &str) -> AppResult<String> {
        let keys = self.key_set().await?;
        tracing::debug!(kid, keys = keys.keys.len(), "Fetched JWK set");
        keys.pem_for_kid(kid)?
            .ok_or_else(|| AppError::NotFound(format!("no JWK for kid: {kid}")))
    }
}
