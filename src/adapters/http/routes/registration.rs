use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    adapters::http::{
        app_state::AppState,
        identity::{CERT_CN_HEADER, RhIdentity, forwarded_ip, header_str},
    },
    app_error::{AppError, AppResult},
    domain::entities::registration::Registration,
};

const DEFAULT_LIMIT: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registrations", get(list_registrations).post(create_registration))
        .route("/registrations/{uid}", delete(delete_registration))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    limit: Option<String>,
    offset: Option<String>,
}

fn parse_non_negative(value: Option<&str>, name: &str, default: i64) -> AppResult<i64> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| AppError::InvalidInput(format!("{name} must be a non-negative integer"))),
    }
}

#[derive(Serialize)]
struct RegistrationResponse {
    uid: String,
    display_name: String,
    username: String,
    created_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationResponse {
    fn from(r: Registration) -> Self {
        Self {
            uid: r.uid,
            display_name: r.display_name,
            username: r.username,
            created_at: r.created_at,
        }
    }
}

#[derive(Serialize)]
struct RegistrationMeta {
    count: i64,
}

#[derive(Serialize)]
struct RegistrationCollection {
    registrations: Vec<RegistrationResponse>,
    meta: RegistrationMeta,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/registrations
async fn list_registrations(
    State(app_state): State<AppState>,
    RhIdentity(identity): RhIdentity,
    Query(params): Query<PageParams>,
) -> AppResult<Json<RegistrationCollection>> {
    let limit = parse_non_negative(params.limit.as_deref(), "limit", DEFAULT_LIMIT)?;
    let offset = parse_non_negative(params.offset.as_deref(), "offset", 0)?;

    let (registrations, count) = app_state
        .registration_use_cases
        .list(&identity, limit, offset)
        .await?;

    Ok(Json(RegistrationCollection {
        registrations: registrations.into_iter().map(Into::into).collect(),
        meta: RegistrationMeta { count },
    }))
}

/// POST /v1/registrations
async fn create_registration(
    State(app_state): State<AppState>,
    RhIdentity(identity): RhIdentity,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let client_ip = forwarded_ip(&headers, &app_state.config.allowlist_header);

    app_state
        .registration_use_cases
        .create(
            &identity,
            client_ip.as_deref(),
            header_str(&headers, CERT_CN_HEADER),
            &body,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully registered" })),
    ))
}

/// DELETE /v1/registrations/{uid}
async fn delete_registration(
    State(app_state): State<AppState>,
    RhIdentity(identity): RhIdentity,
    Path(uid): Path<String>,
) -> AppResult<StatusCode> {
    app_state
        .registration_use_cases
        .delete(&identity, &uid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
