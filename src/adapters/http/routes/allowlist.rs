use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, identity::RhIdentity, routes::parse_json},
    app_error::{AppError, AppResult},
    domain::entities::registration::AllowlistBlock,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/allowlist",
        get(list_blocks).post(allow_block).delete(deny_block),
    )
}

#[derive(Deserialize)]
struct AllowPayload {
    ip_block: String,
}

#[derive(Deserialize)]
struct DenyParams {
    block: Option<String>,
}

/// GET /v1/allowlist
async fn list_blocks(
    State(app_state): State<AppState>,
    RhIdentity(identity): RhIdentity,
) -> AppResult<Json<Vec<AllowlistBlock>>> {
    let blocks = app_state
        .registration_use_cases
        .allowed_addresses(&identity)
        .await?;
    Ok(Json(blocks))
}

/// POST /v1/allowlist
async fn allow_block(
    State(app_state): State<AppState>,
    RhIdentity(identity): RhIdentity,
    body: Bytes,
) -> AppResult<StatusCode> {
    let payload: AllowPayload = parse_json(&body)?;
    app_state
        .registration_use_cases
        .allow_address(&identity, &payload.ip_block)
        .await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /v1/allowlist?block=<cidr>
async fn deny_block(
    State(app_state): State<AppState>,
    RhIdentity(identity): RhIdentity,
    Query(params): Query<DenyParams>,
) -> AppResult<StatusCode> {
    let block = params
        .block
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("required query parameter [block] missing".into()))?;

    app_state
        .registration_use_cases
        .deny_address(&identity, &block)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::adapters::http::identity::IDENTITY_HEADER;
    use crate::test_utils::{TestAppStateBuilder, create_test_identity, identity_header};

    fn server() -> TestServer {
        TestServer::new(router().with_state(TestAppStateBuilder::new().build())).unwrap()
    }

    #[tokio::test]
    async fn allow_list_and_deny() {
        let server = server();
        let header = identity_header(&create_test_identity(|_| {}));

        server
            .post("/allowlist")
            .add_header(IDENTITY_HEADER, header.clone())
            .json(&json!({ "ip_block": "10.0.0.0/24" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get("/allowlist")
            .add_header(IDENTITY_HEADER, header.clone())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body[0]["ip_block"], "10.0.0.0/24");
        assert_eq!(body[0]["org_id"], "1234");

        server
            .delete("/allowlist")
            .add_query_param("block", "10.0.0.0/24")
            .add_header(IDENTITY_HEADER, header.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .delete("/allowlist")
            .add_query_param("block", "10.0.0.0/24")
            .add_header(IDENTITY_HEADER, header)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_cidr_returns_400() {
        let header = identity_header(&create_test_identity(|_| {}));
        server()
            .post("/allowlist")
            .add_header(IDENTITY_HEADER, header)
            .json(&json!({ "ip_block": "banana" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let header = identity_header(&create_test_identity(|i| i.user.is_org_admin = false));
        server()
            .get("/allowlist")
            .add_header(IDENTITY_HEADER, header)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
