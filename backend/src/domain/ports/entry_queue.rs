//! Driven port for the queue of entries awaiting sentiment review.
use async_trait::async_trait;

use crate::domain::JournalEntry;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the entry queue adapter.
    pub enum EntryQueueError {
        /// Queue infrastructure is unavailable.
        Unavailable { message: String } => "entry queue is unavailable: {message}",
        /// The message could not be encoded or was refused.
        Rejected { message: String } => "entry was rejected by the queue: {message}",
    }
}

/// A message as delivered to the review consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub message_id: String,
    /// JSON-encoded entry record.
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryQueue: Send + Sync {
    /// Enqueue one entry for review.
    async fn enqueue(&self, entry: &JournalEntry) -> Result<(), EntryQueueError>;
}
