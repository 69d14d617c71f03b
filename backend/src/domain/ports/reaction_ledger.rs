//! Driving port for liking shared entries.
use async_trait::async_trait;

use crate::domain::{EntryId, EntryIndex, Error, UserId};

/// A like of one entry line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    /// Author of the entry being liked.
    pub creator_id: UserId,
    pub entry_id: EntryId,
    pub index: EntryIndex,
    pub liked_by: UserId,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReactionLedger: Send + Sync {
    /// Record a like; liking the same line twice leaves one record.
    async fn react(&self, reaction: Reaction) -> Result<(), Error>;

    /// The subset of `ids` that `user_id` has liked.
    async fn liked(&self, user_id: &UserId, ids: Vec<String>) -> Result<Vec<String>, Error>;
}
