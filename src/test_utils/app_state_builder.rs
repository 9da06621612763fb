//! Test app state builder for HTTP-level tests.
//!
//! `TestAppStateBuilder` wires an `AppState` from in-memory doubles so routers
//! can be exercised with `axum_test::TestServer`.

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::SecretString;
use time::Duration;

use crate::{
    adapters::{http::app_state::AppState, jwks::JwksClient},
    application::{
        jwt::TokenSigner,
        use_cases::{
            directory::{DirectoryConnector, DirectoryUseCases},
            mail::{Emailer, MailUseCases},
            registration::RegistrationUseCases,
        },
    },
    domain::entities::modules::StoreBackend,
    infra::{
        config::{AppConfig, JwkConfig, TokenConfig},
        memory_store::InMemoryRegistrationStore,
    },
    test_utils::{RecordingEmailer, TEST_TOKEN_KEY},
};

pub const TEST_FROM_EMAIL: &str = "from@example.com";
pub const TEST_TO_EMAIL: &str = "default@example.com";

pub struct TestAppStateBuilder {
    directory: Option<Arc<dyn DirectoryConnector>>,
    emailer: Option<Arc<RecordingEmailer>>,
    store: Arc<InMemoryRegistrationStore>,
    allowlist_enabled: bool,
    token: Option<TokenConfig>,
    jwk: Option<JwkConfig>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            directory: None,
            emailer: None,
            store: Arc::new(InMemoryRegistrationStore::new()),
            allowlist_enabled: false,
            token: None,
            jwk: None,
        }
    }

    pub fn with_directory(mut self, directory: impl DirectoryConnector + 'static) -> Self {
        self.directory = Some(Arc::new(directory));
        self
    }

    pub fn with_emailer(mut self, emailer: Arc<RecordingEmailer>) -> Self {
        self.emailer = Some(emailer);
        self
    }

    pub fn with_store(mut self, store: Arc<InMemoryRegistrationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_allowlist_enabled(mut self) -> Self {
        self.allowlist_enabled = true;
        self
    }

    /// Sign tokens with the fixture key.
    pub fn with_token_signer(mut self) -> Self {
        self.token = Some(TokenConfig {
            private_key: SecretString::from(TEST_TOKEN_KEY),
            kid: "test-kid".to_string(),
            ttl: Duration::hours(1),
        });
        self
    }

    /// Serve public keys from the JWK set at `url`.
    pub fn with_jwk_url(mut self, url: &str) -> Self {
        self.jwk = Some(JwkConfig {
            url: url::Url::parse(url).unwrap(),
            timeout: std::time::Duration::from_secs(5),
        });
        self
    }

    pub fn build(self) -> AppState {
        let config = AppConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            users_module: self.directory.as_ref().map(|d| d.module()),
            mailer_module: None,
            from_email: TEST_FROM_EMAIL.to_string(),
            to_email: TEST_TO_EMAIL.to_string(),
            ams: None,
            keycloak: None,
            store_backend: StoreBackend::Memory,
            database_url: None,
            allowlist_enabled: self.allowlist_enabled,
            allowlist_header: "x-forwarded-for".to_string(),
            token: self.token.clone(),
            jwk: self.jwk.clone(),
            log_file: None,
        };

        let mail_use_cases = self.emailer.map(|emailer| {
            Arc::new(MailUseCases::new(
                self.directory.clone(),
                emailer as Arc<dyn Emailer>,
                config.from_email.clone(),
                config.to_email.clone(),
            ))
        });

        let token_signer = self
            .token
            .map(|token| Arc::new(TokenSigner::new(token.private_key, token.kid)));

        AppState {
            config: Arc::new(config),
            directory_use_cases: Arc::new(DirectoryUseCases::new(self.directory)),
            mail_use_cases,
            registration_use_cases: Arc::new(RegistrationUseCases::new(
                self.store,
                self.allowlist_enabled,
            )),
            token_signer,
            jwks_client: self.jwk.map(|jwk| Arc::new(JwksClient::new(jwk))),
        }
    }
}
