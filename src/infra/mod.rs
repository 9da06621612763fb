use crate::{adapters::persistence::PostgresPersistence, infra::db::init_db};

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod http_client;
pub mod memory_store;
pub mod setup;

pub async fn postgres_persistence(
    database_url: &str,
) -> Result<PostgresPersistence, error::InfraError> {
    let pool = init_db(database_url).await?;
    Ok(PostgresPersistence::new(pool))
}
