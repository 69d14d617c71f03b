//! Driven port delivering login codes out of band.
use async_trait::async_trait;

use crate::domain::{Email, OtpCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by mailer adapters.
    pub enum LoginMailerError {
        /// The provider refused or failed to send the message.
        Delivery { message: String } => "login email delivery failed: {message}",
    }
}

/// Subject line of the login email.
pub const LOGIN_EMAIL_SUBJECT: &str = "Gratitude login token";

/// HTML body of the login email.
pub fn login_email_body(code: &OtpCode, ttl_minutes: u32) -> String {
    format!(
        "<p>Your token is: {}.</p><p>This token will expire in {ttl_minutes} minutes.</p>",
        code.expose()
    )
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginMailer: Send + Sync {
    /// Send `code` to `to`, mentioning that it lapses after `ttl_minutes`.
    async fn send_login_code(
        &self,
        to: &Email,
        code: &OtpCode,
        ttl_minutes: u32,
    ) -> Result<(), LoginMailerError>;
}
