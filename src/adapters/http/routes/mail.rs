use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use serde_json::{Value, json};

use crate::{
    adapters::http::{app_state::AppState, routes::parse_json},
    app_error::{AppError, AppResult},
    domain::entities::email::Emails,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/sendEmails", post(send_emails))
}

/// POST /v1/sendEmails
async fn send_emails(State(app_state): State<AppState>, body: Bytes) -> AppResult<Json<Value>> {
    let mail = app_state
        .mail_use_cases
        .as_ref()
        .ok_or(AppError::NotConfigured("mailer module"))?;

    let emails: Emails = parse_json(&body)?;
    mail.send_emails(emails).await?;

    Ok(Json(json!({ "message": "success" })))
}
