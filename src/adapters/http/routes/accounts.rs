use std::str::FromStr;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, routes::parse_json},
    app_error::{AppError, AppResult},
    domain::entities::query::{SortOrder, UserV3Query, UsersByBody},
    use_cases::directory::DirectoryResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{org_id}/users", get(list_users))
        .route("/{org_id}/usersBy", post(find_users))
}

// ============================================================================
// Query parsing
// ============================================================================

/// Raw query string; validated into [`UserV3Query`].
#[derive(Debug, Default, Deserialize)]
pub(crate) struct V3Params {
    limit: Option<String>,
    offset: Option<String>,
    #[serde(rename = "sortOrder", alias = "sort_order")]
    sort_order: Option<String>,
    admin_only: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TryFrom<V3Params> for UserV3Query {
    type Error = AppError;

    fn try_from(params: V3Params) -> AppResult<Self> {
        let mut query = UserV3Query::default();

        if let Some(limit) = present(&params.limit) {
            query.limit = limit
                .parse::<u32>()
                .ok()
                .filter(|l| (1..=UserV3Query::MAX_LIMIT).contains(l))
                .ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "limit must be an integer between 1 and {}",
                        UserV3Query::MAX_LIMIT
                    ))
                })?;
        }
        if let Some(offset) = present(&params.offset) {
            query.offset = offset.parse::<u32>().map_err(|_| {
                AppError::InvalidInput("offset must be a non-negative integer".into())
            })?;
        }
        if let Some(sort_order) = present(&params.sort_order) {
            query.sort_order = SortOrder::from_str(sort_order)
                .map_err(|_| AppError::InvalidInput("sortOrder must be asc or desc".into()))?;
        }
        if let Some(admin_only) = present(&params.admin_only) {
            query.admin_only = admin_only
                .parse::<bool>()
                .map_err(|_| AppError::InvalidInput("admin_only must be true or false".into()))?;
        }

        Ok(query)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v3/accounts/{org_id}/users
async fn list_users(
    State(app_state): State<AppState>,
    Path(org_id): Path<String>,
    Query(params): Query<V3Params>,
) -> AppResult<Json<DirectoryResponse>> {
    let query = UserV3Query::try_from(params)?;
    let response = app_state
        .directory_use_cases
        .list_account_users(&org_id, query)
        .await?;
    Ok(Json(response))
}

/// POST /v3/accounts/{org_id}/usersBy
async fn find_users(
    State(app_state): State<AppState>,
    Path(org_id): Path<String>,
    Query(params): Query<V3Params>,
    body: Bytes,
) -> AppResult<Json<DirectoryResponse>> {
    let query = UserV3Query::try_from(params)?;
    let filter: UsersByBody = parse_json(&body)?;
    let response = app_state
        .directory_use_cases
        .find_account_users(&org_id, query, filter)
        .await?;
    Ok(Json(response))
}
