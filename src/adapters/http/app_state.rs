use std::sync::Arc;

use crate::{
    adapters::jwks::JwksClient,
    application::jwt::TokenSigner,
    infra::config::AppConfig,
    use_cases::{
        directory::DirectoryUseCases, mail::MailUseCases, registration::RegistrationUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory_use_cases: Arc<DirectoryUseCases>,
    /// `None` when no mailer module is configured.
    pub mail_use_cases: Option<Arc<MailUseCases>>,
    pub registration_use_cases: Arc<RegistrationUseCases>,
    /// `None` when no signing key is configured.
    pub token_signer: Option<Arc<TokenSigner>>,
    /// `None` when no `JWK_URL` is configured.
    pub jwks_client: Option<Arc<JwksClient>>,
}
