use std::sync::Arc;

use crate::{
    application::use_cases::directory::DirectoryConnector,
    domain::entities::modules::UsersModule,
    infra::{config::AppConfig, error::InfraError},
};

pub mod ams;
pub mod keycloak;
pub mod mock;

/// Builds the connector for the configured users module.
///
/// Returns `None` when no module is configured; the directory endpoints then
/// answer 501.
pub fn connector_from_config(
    config: &AppConfig,
) -> Result<Option<Arc<dyn DirectoryConnector>>, InfraError> {
    let connector: Arc<dyn DirectoryConnector> = match config.users_module {
        None => return Ok(None),
        Some(UsersModule::Ams) => Arc::new(ams::AmsConnector::new(
            config
                .ams
                .clone()
                .ok_or(InfraError::ConfigMissing { var: "AMS_URL" })?,
        )),
        Some(UsersModule::Keycloak) => Arc::new(keycloak::KeycloakConnector::new(
            config.keycloak.clone().ok_or(InfraError::ConfigMissing {
                var: "KEYCLOAK_USER_SERVICE_URL",
            })?,
        )),
        Some(UsersModule::Mock) => Arc::new(mock::MockDirectory),
    };

    tracing::info!(users_module = %connector.module(), "Directory backend selected");
    Ok(Some(connector))
}
