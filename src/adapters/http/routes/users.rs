use std::str::FromStr;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    routing::post,
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, routes::parse_json},
    app_error::{AppError, AppResult},
    domain::entities::{
        query::{SortOrder, UserBody, UserV1Query},
        user::Users,
    },
};

pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(users_by_usernames))
}

#[derive(Debug, Default, Deserialize)]
struct V1Params {
    #[serde(rename = "queryBy", alias = "query_by")]
    query_by: Option<String>,
    #[serde(rename = "sortOrder", alias = "sort_order")]
    sort_order: Option<String>,
}

impl TryFrom<V1Params> for UserV1Query {
    type Error = AppError;

    fn try_from(params: V1Params) -> AppResult<Self> {
        let sort_order = params
            .sort_order
            .filter(|s| !s.is_empty())
            .map(|s| SortOrder::from_str(&s))
            .transpose()
            .map_err(|_| AppError::InvalidInput("sortOrder must be asc or desc".into()))?;

        Ok(UserV1Query {
            query_by: params.query_by.filter(|q| !q.is_empty()),
            sort_order,
        })
    }
}

/// POST /v1/users
async fn users_by_usernames(
    State(app_state): State<AppState>,
    Query(params): Query<V1Params>,
    body: Bytes,
) -> AppResult<Json<Users>> {
    let query = UserV1Query::try_from(params)?;
    let body: UserBody = parse_json(&body)?;
    let users = app_state
        .directory_use_cases
        .users_by_usernames(body, query)
        .await?;
    Ok(Json(users))
}
