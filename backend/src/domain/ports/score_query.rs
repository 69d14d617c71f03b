//! Driving port for the per-user aggregates.
use async_trait::async_trait;

use crate::domain::{Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreQuery: Send + Sync {
    /// Reactions received across all of the user's shared entries.
    async fn influence(&self, user_id: &UserId) -> Result<u64, Error>;

    /// Current consecutive-day streak; zero before the first submission.
    async fn streak(&self, user_id: &UserId) -> Result<u32, Error>;
}
