//! Mailer that writes login emails to the log instead of a provider.
//!
//! Only the envelope is logged. The body carries the login code and never
//! reaches the log.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{LOGIN_EMAIL_SUBJECT, LoginMailer, LoginMailerError, login_email_body};
use crate::domain::{Email, OtpCode};

#[derive(Debug, Clone)]
pub struct LoggingMailer {
    source: String,
}

impl LoggingMailer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[async_trait]
impl LoginMailer for LoggingMailer {
    async fn send_login_code(
        &self,
        to: &Email,
        code: &OtpCode,
        ttl_minutes: u32,
    ) -> Result<(), LoginMailerError> {
        let body = login_email_body(code, ttl_minutes);
        info!(
            from = %self.source,
            to = %to,
            subject = LOGIN_EMAIL_SUBJECT,
            body_bytes = body.len(),
            "login email sent"
        );
        Ok(())
    }
}
