//! Recording mailer double.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::email::Email,
    use_cases::mail::Emailer,
};

/// Keeps every successfully sent email with its from address.
#[derive(Default)]
pub struct RecordingEmailer {
    sent: Mutex<Vec<(Email, String)>>,
    attempts: Mutex<usize>,
    fail: bool,
}

impl RecordingEmailer {
    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(Email, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Emailer for RecordingEmailer {
    async fn send_email(&self, email: &Email, from_address: &str) -> AppResult<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail {
            return Err(AppError::Internal("smtp unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.clone(), from_address.to_string()));
        Ok(())
    }
}
