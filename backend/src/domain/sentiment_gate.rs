//! Sentiment gate: publishes queued entries whose text scores non-negative.
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{KeyValueStore, QueuedMessage};
use crate::domain::records::{EntryRecord, Table};
use crate::domain::service_support::{batch_write_all, encode, map_store_error};
use crate::domain::{Error, JournalEntry, SentimentAnalyzer};

/// Counts from one reviewed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub published: usize,
    pub dropped: usize,
    /// Messages whose body was not a readable entry.
    pub malformed: usize,
}

pub struct SentimentGate<S: ?Sized> {
    store: Arc<S>,
    analyzer: SentimentAnalyzer,
}

impl<S: ?Sized> SentimentGate<S> {
    pub fn new(store: Arc<S>, analyzer: SentimentAnalyzer) -> Self {
        Self { store, analyzer }
    }
}

fn parse_message(message: &QueuedMessage) -> Result<JournalEntry, String> {
    let record: EntryRecord =
        serde_json::from_str(&message.body).map_err(|err| err.to_string())?;
    record.into_entry().map_err(|err| err.to_string())
}

impl<S: ?Sized> SentimentGate<S>
where
    S: KeyValueStore,
{
    /// Score each message and write the shareable ones with their social
    /// index set to the day they were written.
    ///
    /// # Errors
    /// Any store failure, including items left unwritten, fails the whole
    /// batch so the queue redelivers it.
    pub async fn review(&self, messages: Vec<QueuedMessage>) -> Result<ReviewOutcome, Error> {
        let mut outcome = ReviewOutcome::default();
        let mut items = Vec::new();
        for message in &messages {
            let mut entry = match parse_message(message) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(message_id = %message.message_id, error = %err, "unreadable review message");
                    outcome.malformed += 1;
                    continue;
                }
            };
            let score = self.analyzer.score(&entry.text);
            if score < 0 {
                info!(
                    message_id = %message.message_id,
                    entry_id = %entry.id,
                    score,
                    "entry held back from the social feed"
                );
                outcome.dropped += 1;
                continue;
            }
            entry.shared_on = Some(entry.written_on);
            items.push(encode(&EntryRecord::from_entry(&entry))?);
        }

        outcome.published = items.len();
        if items.is_empty() {
            return Ok(outcome);
        }
        let written = batch_write_all(&*self.store, Table::Journal, items)
            .await
            .map_err(map_store_error)?;
        if !written.unprocessed.is_empty() {
            warn!(
                count = written.unprocessed.len(),
                "shared entries left unwritten"
            );
            return Err(Error::internal("failed to publish every shared entry"));
        }
        info!(
            published = outcome.published,
            dropped = outcome.dropped,
            malformed = outcome.malformed,
            "review batch applied"
        );
        Ok(outcome)
    }
}
