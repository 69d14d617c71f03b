//! Driving port for signup and profile lookup.
use async_trait::async_trait;

use crate::domain::{Error, Registration, UserId, UserProfile};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// Create an account.
    ///
    /// # Errors
    /// `Conflict` when the email is already registered.
    async fn register(&self, registration: Registration) -> Result<UserId, Error>;

    /// Profile of the authenticated user.
    async fn profile(&self, user_id: &UserId) -> Result<UserProfile, Error>;
}
