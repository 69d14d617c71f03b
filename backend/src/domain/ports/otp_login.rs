//! Driving port for the email one-time-password login flow.
use async_trait::async_trait;

use crate::domain::{Email, Error, OtpCode, SessionToken, TokenId};

/// Second leg of a login: the code the user received by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfirmation {
    pub email: Email,
    pub token_id: TokenId,
    pub code: OtpCode,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpLogin: Send + Sync {
    /// Email a fresh code to a registered user and return the attempt id.
    async fn initiate(&self, email: &Email) -> Result<TokenId, Error>;

    /// Exchange a correct code for a session token.
    async fn confirm(&self, confirmation: LoginConfirmation) -> Result<SessionToken, Error>;
}
