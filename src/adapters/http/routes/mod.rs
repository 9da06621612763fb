pub mod accounts;
pub mod allowlist;
pub mod health;
pub mod jwt;
pub mod mail;
pub mod registration;
pub mod token;
pub mod users;

use axum::{Router, body::Bytes};
use serde::de::DeserializeOwned;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/v3/accounts", accounts::router())
        .nest(
            "/v1",
            Router::new()
                .merge(users::router())
                .merge(mail::router())
                .merge(registration::router())
                .merge(allowlist::router())
                .merge(token::router())
                .merge(jwt::router()),
        )
}

/// Decodes a JSON request body, reporting any failure as a 400.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("invalid request body: {e}")))
}
