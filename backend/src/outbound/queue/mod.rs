//! In-process review queue backed by a bounded tokio channel.
//!
//! Each shared entry becomes one [`QueuedMessage`] whose body is the JSON
//! entry record, the same shape the sentiment gate decodes.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::JournalEntry;
use crate::domain::ports::{EntryQueue, EntryQueueError, QueuedMessage};
use crate::domain::records::EntryRecord;

/// Default number of messages buffered before `enqueue` waits.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ChannelEntryQueue {
    sender: mpsc::Sender<QueuedMessage>,
}

impl ChannelEntryQueue {
    /// Create the queue and the receiver its consumer drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<QueuedMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EntryQueue for ChannelEntryQueue {
    async fn enqueue(&self, entry: &JournalEntry) -> Result<(), EntryQueueError> {
        let body = serde_json::to_string(&EntryRecord::from_entry(entry))
            .map_err(|err| EntryQueueError::rejected(err.to_string()))?;
        let message = QueuedMessage {
            message_id: Uuid::new_v4().to_string(),
            body,
        };
        let message_id = message.message_id.clone();
        self.sender
            .send(message)
            .await
            .map_err(|_| EntryQueueError::unavailable("review consumer has stopped"))?;
        debug!(%message_id, entry_id = %entry.id, "entry queued for review");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryId, EntryIndex, UserId};
    use chrono::NaiveDate;

    fn entry() -> JournalEntry {
        JournalEntry {
            user_id: UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id"),
            id: EntryId::new("sub-1").expect("valid id"),
            index: EntryIndex::try_from(1_i64).expect("valid index"),
            text: "sunshine".to_owned(),
            written_on: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
            shared_on: None,
        }
    }

    #[tokio::test]
    async fn messages_carry_the_entry_record() {
        let (queue, mut receiver) = ChannelEntryQueue::channel(4);
        queue.enqueue(&entry()).await.expect("queued");

        let message = receiver.recv().await.expect("message delivered");
        let record: EntryRecord = serde_json::from_str(&message.body).expect("record json");
        assert_eq!(record, EntryRecord::from_entry(&entry()));
        assert!(Uuid::parse_str(&message.message_id).is_ok());
    }

    #[tokio::test]
    async fn closed_consumers_make_the_queue_unavailable() {
        let (queue, receiver) = ChannelEntryQueue::channel(1);
        drop(receiver);
        let err = queue.enqueue(&entry()).await.expect_err("closed");
        assert!(matches!(err, EntryQueueError::Unavailable { .. }));
    }
}
