use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/jwt", get(public_key))
}

#[derive(Debug, Default, Deserialize)]
struct JwtParams {
    kid: Option<String>,
}

#[derive(Serialize)]
struct PubkeyResponse {
    pubkey: String,
}

/// GET /v1/jwt?kid=
async fn public_key(
    State(app_state): State<AppState>,
    Query(params): Query<JwtParams>,
) -> AppResult<Json<PubkeyResponse>> {
    let Some(jwks) = &app_state.jwks_client else {
        return Err(AppError::NotConfigured("JWK url"));
    };

    let kid = params
        .kid
        .as_deref()
        .map(str::trim)
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| AppError::InvalidInput("kid required to return correct pub key".into()))?;

    let pubkey = jwks.public_key_pem(kid).await?;
    Ok(Json(PubkeyResponse { pubkey }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::test_utils::{TEST_TOKEN_PUBLIC_KEY, TestAppStateBuilder, test_jwks};

    async fn jwks_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(test_jwks("key-1")))
            .mount(&server)
            .await;
        server
    }

    fn server(jwks: &MockServer) -> TestServer {
        let app_state = TestAppStateBuilder::new()
            .with_jwk_url(&format!("{}/certs", jwks.uri()))
            .build();
        TestServer::new(router().with_state(app_state)).unwrap()
    }

    #[tokio::test]
    async fn returns_pem_for_known_kid() {
        let jwks = jwks_server().await;
        let response = server(&jwks).get("/jwt").add_query_param("kid", "key-1").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "pubkey": TEST_TOKEN_PUBLIC_KEY.trim_end() }));
    }

    #[tokio::test]
    async fn missing_kid_returns_400() {
        let jwks = jwks_server().await;
        let response = server(&jwks).get("/jwt").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "kid required to return correct pub key");
    }

    #[tokio::test]
    async fn unknown_kid_returns_404() {
        let jwks = jwks_server().await;
        server(&jwks)
            .get("/jwt")
            .add_query_param("kid", "rotated-away")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unconfigured_jwk_url_returns_501() {
        let server = TestServer::new(router().with_state(TestAppStateBuilder::new().build())).unwrap();
        server
            .get("/jwt")
            .add_query_param("kid", "key-1")
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);
    }
}
