use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::{
    adapters::http::{app_state::AppState, identity::RhIdentity},
    app_error::{AppError, AppResult},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/token", get(issue_token))
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

/// GET /v1/token
async fn issue_token(
    State(app_state): State<AppState>,
    RhIdentity(identity): RhIdentity,
) -> AppResult<Json<TokenResponse>> {
    if !identity.is_org_admin() {
        return Err(AppError::Forbidden(
            "user must be org admin to obtain satellite token".into(),
        ));
    }
    if identity.org_id.is_empty() {
        return Err(AppError::InvalidInput("Missing org_id in x-rh-identity".into()));
    }
    if identity.user.username.is_empty() {
        return Err(AppError::InvalidInput("Missing username in x-rh-identity".into()));
    }

    let (Some(signer), Some(token_config)) = (&app_state.token_signer, &app_state.config.token)
    else {
        return Err(AppError::NotConfigured("token signing key"));
    };

    let token = signer.create(token_config.ttl, &identity)?;
    tracing::info!(org_id = %identity.org_id, username = %identity.user.username, "Issued token");
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
    use serde_json::Value;

    use crate::adapters::http::identity::IDENTITY_HEADER;
    use crate::application::jwt::IdentityClaims;
    use crate::test_utils::{
        TEST_TOKEN_PUBLIC_KEY, TestAppStateBuilder, create_test_identity, identity_header,
    };

    fn server(builder: TestAppStateBuilder) -> TestServer {
        TestServer::new(router().with_state(builder.build())).unwrap()
    }

    #[tokio::test]
    async fn issues_verifiable_token() {
        let response = server(TestAppStateBuilder::new().with_token_signer())
            .get("/token")
            .add_header(IDENTITY_HEADER, identity_header(&create_test_identity(|_| {})))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let claims = decode::<IdentityClaims>(
            body["token"].as_str().unwrap(),
            &DecodingKey::from_rsa_pem(TEST_TOKEN_PUBLIC_KEY.as_bytes()).unwrap(),
            &Validation::new(Algorithm::RS256),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.org_id, "1234");
        assert_eq!(claims.username, "admin");
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let header = identity_header(&create_test_identity(|i| i.user.is_org_admin = false));
        server(TestAppStateBuilder::new().with_token_signer())
            .get("/token")
            .add_header(IDENTITY_HEADER, header)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_username_returns_400() {
        let header = identity_header(&create_test_identity(|i| i.user.username.clear()));
        server(TestAppStateBuilder::new().with_token_signer())
            .get("/token")
            .add_header(IDENTITY_HEADER, header)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_signer_returns_501() {
        server(TestAppStateBuilder::new())
            .get("/token")
            .add_header(IDENTITY_HEADER, identity_header(&create_test_identity(|_| {})))
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);
    }
}
