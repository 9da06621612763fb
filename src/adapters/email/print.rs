use std::io::Write;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::email::Email,
    use_cases::mail::Emailer,
};

const BODY_PREVIEW_CHARS: usize = 50;

/// Writes a summary of each message to stdout instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintEmailer;

fn render(email: &Email, from_address: &str) -> String {
    let preview: String = email.body.chars().take(BODY_PREVIEW_CHARS).collect();
    format!(
        "From: {from_address}\nTo: {:?}\nCC: {:?}\nBCC: {:?}\nSubject: {}\nBodyType: {}\nMessage: {preview}...(truncated to {BODY_PREVIEW_CHARS} chars)\n",
        email.recipients, email.cc_list, email.bcc_list, email.subject, email.body_type,
    )
}

#[async_trait]
impl Emailer for PrintEmailer {
    async fn send_email(&self, email: &Email, from_address: &str) -> AppResult<()> {
        std::io::stdout()
            .lock()
            .write_all(render(email, from_address).as_bytes())
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
