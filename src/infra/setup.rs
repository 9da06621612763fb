use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        directory::connector_from_config, email::emailer_for, http::app_state::AppState,
        jwks::JwksClient,
    },
    application::jwt::TokenSigner,
    domain::entities::modules::StoreBackend,
    infra::{
        config::AppConfig, error::InfraError, memory_store::InMemoryRegistrationStore,
        postgres_persistence,
    },
    use_cases::{
        directory::DirectoryUseCases,
        mail::MailUseCases,
        registration::{RegistrationStore, RegistrationUseCases},
    },
};

pub async fn init_app_state(config: AppConfig) -> Result<AppState, InfraError> {
    let directory = connector_from_config(&config)?;

    let store: Arc<dyn RegistrationStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(InfraError::ConfigMissing { var: "DATABASE_URL" })?;
            Arc::new(postgres_persistence(database_url).await?)
        }
        StoreBackend::Memory => Arc::new(InMemoryRegistrationStore::new()),
    };
    tracing::info!(store_backend = %config.store_backend, "Registration store ready");

    let mail_use_cases = config.mailer_module.map(|module| {
        tracing::info!(mailer_module = %module, "Mailer selected");
        Arc::new(MailUseCases::new(
            directory.clone(),
            emailer_for(module),
            config.from_email.clone(),
            config.to_email.clone(),
        ))
    });

    let token_signer = config
        .token
        .as_ref()
        .map(|token| Arc::new(TokenSigner::new(token.private_key.clone(), token.kid.clone())));

    let jwks_client = config
        .jwk
        .clone()
        .map(|jwk| Arc::new(JwksClient::new(jwk)));

    let registration_use_cases = RegistrationUseCases::new(store, config.allowlist_enabled);

    Ok(AppState {
        directory_use_cases: Arc::new(DirectoryUseCases::new(directory)),
        mail_use_cases,
        registration_use_cases: Arc::new(registration_use_cases),
        token_signer,
        jwks_client,
        config: Arc::new(config),
    })
}

pub fn init_tracing(log_file: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "directory_gateway=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), only when LOG_FILE is set
    let json_layer = log_file.and_then(|path| match File::create(path) {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
        ),
        Err(err) => {
            eprintln!("cannot create log file {path}: {err}");
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
