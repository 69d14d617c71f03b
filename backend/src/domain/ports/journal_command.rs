//! Driving port for writing and sharing journal entries.
use async_trait::async_trait;

use crate::domain::{EntryId, Error, Submission, UserId};

/// Outcome of sharing today's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareOutcome {
    pub queued: usize,
    pub failed: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JournalCommand: Send + Sync {
    /// Store the three entries of a submission, dated today.
    async fn submit(&self, user_id: &UserId, submission: Submission) -> Result<EntryId, Error>;

    /// Queue today's entries for sentiment review. Send failures are counted,
    /// not raised.
    async fn share_today(&self, user_id: &UserId) -> Result<ShareOutcome, Error>;
}
