//! Driving port for reading journal entries.
use async_trait::async_trait;

use crate::domain::{Error, SocialPage, TodayEntries, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JournalQuery: Send + Sync {
    /// The caller's entries for today; blank slots when none were written.
    async fn today(&self, user_id: &UserId) -> Result<TodayEntries, Error>;

    /// A page of today's shared entries.
    ///
    /// # Errors
    /// `InvalidRequest` when `next_token` is not a cursor this feed issued.
    async fn social_feed(&self, next_token: Option<String>) -> Result<SocialPage, Error>;
}
