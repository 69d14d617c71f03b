//! Driven port for signing and verifying bearer session tokens.

use crate::domain::{SessionClaims, SessionToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by session token adapters.
    pub enum SessionTokenError {
        /// The token could not be signed.
        Signing { message: String } => "session token signing failed: {message}",
        /// Signature, issuer, audience or expiry did not check out.
        Invalid { message: String } => "session token rejected: {message}",
    }
}

/// Issues tokens carrying a `userId` claim and verifies presented ones.
#[cfg_attr(test, mockall::automock)]
pub trait SessionTokens: Send + Sync {
    /// Sign a token for `user_id`.
    fn issue(&self, user_id: &UserId) -> Result<SessionToken, SessionTokenError>;

    /// Check signature, issuer, audience and expiry of `token`.
    fn verify(&self, token: &str) -> Result<SessionClaims, SessionTokenError>;
}
