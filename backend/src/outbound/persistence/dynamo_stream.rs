//! DynamoDB Streams consumer feeding the in-process change channel.
//!
//! The journal table's stream is polled shard by shard. Each record becomes a
//! [`ChangeEvent`] on a broadcast channel, the same channel shape the
//! in-memory store publishes on, so the aggregator worker runs unchanged.
//! Shards found at start-up are read from their latest position; shards that
//! appear later (after a split) are read from their start.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use aws_sdk_dynamodbstreams::Client;
use aws_sdk_dynamodbstreams::types::{AttributeValue, OperationType, Record, ShardIteratorType};
use serde_dynamo::aws_sdk_dynamodbstreams_1::from_item;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::domain::events::ChangeEvent;
use crate::domain::records::{Item, Table};

/// Pause between polls of every open shard.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Pause after a failed stream call.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);
/// Records requested per `GetRecords` call; the service maximum.
const RECORDS_PER_CALL: i32 = 1000;

/// Map one stream record onto a journal change event.
///
/// Returns `Ok(None)` for operations this service does not know.
///
/// # Errors
/// Fails when an image does not convert into an item.
pub fn change_event(record: Record) -> Result<Option<ChangeEvent>, serde_dynamo::Error> {
    let (new_image, old_image) = match record.dynamodb {
        Some(images) => (decode(images.new_image)?, decode(images.old_image)?),
        None => (None, None),
    };
    let event = match record.event_name {
        Some(OperationType::Insert) => new_image.map(|item| ChangeEvent::insert(Table::Journal, item)),
        Some(OperationType::Modify) => match (old_image, new_image) {
            (Some(old), Some(new)) => Some(ChangeEvent::modify(Table::Journal, old, new)),
            _ => None,
        },
        Some(OperationType::Remove) => old_image.map(|item| ChangeEvent::remove(Table::Journal, item)),
        _ => None,
    };
    Ok(event)
}

fn decode(
    image: Option<HashMap<String, AttributeValue>>,
) -> Result<Option<Item>, serde_dynamo::Error> {
    image.map(from_item).transpose()
}

/// Where reading a shard (re)starts.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShardStart {
    Latest,
    TrimHorizon,
    After(String),
}

impl ShardStart {
    fn resume(last_sequence: Option<String>, fallback: Self) -> Self {
        last_sequence.map_or(fallback, Self::After)
    }
}

#[derive(Debug)]
enum ShardCursor {
    Pending(ShardStart),
    Reading {
        iterator: String,
        last_sequence: Option<String>,
    },
    Closed,
}

/// Polls the journal table stream and republishes its records.
pub struct DynamoStreamPoller {
    client: Client,
    stream_arn: String,
    sender: broadcast::Sender<ChangeEvent>,
    poll_interval: Duration,
    shards: BTreeMap<String, ShardCursor>,
}

impl DynamoStreamPoller {
    pub fn new(
        client: Client,
        stream_arn: impl Into<String>,
        sender: broadcast::Sender<ChangeEvent>,
    ) -> Self {
        Self {
            client,
            stream_arn: stream_arn.into(),
            sender,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shards: BTreeMap::new(),
        }
    }

    /// Streams client built from a loaded AWS configuration.
    pub fn from_config(
        config: &aws_config::SdkConfig,
        stream_arn: impl Into<String>,
        sender: broadcast::Sender<ChangeEvent>,
    ) -> Self {
        Self::new(Client::new(config), stream_arn, sender)
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until every receiver of the change channel has gone.
    pub async fn run(mut self) {
        info!(stream = %self.stream_arn, "polling journal table stream");
        let mut first_pass = true;
        while self.sender.receiver_count() > 0 {
            let delay = match self.poll_once(first_pass).await {
                Ok(published) => {
                    first_pass = false;
                    if published > 0 {
                        debug!(published, "stream records published");
                    }
                    self.poll_interval
                }
                Err(err) => {
                    error!(error = %err, "journal stream poll failed");
                    ERROR_BACKOFF
                }
            };
            tokio::time::sleep(delay).await;
        }
        info!("change channel closed; stream poller stopping");
    }

    async fn poll_once(&mut self, first_pass: bool) -> Result<usize, String> {
        self.discover_shards(first_pass).await?;
        let mut published = 0;
        let shard_ids: Vec<String> = self.shards.keys().cloned().collect();
        for shard_id in shard_ids {
            published += self.drain_shard(&shard_id).await;
        }
        Ok(published)
    }

    async fn discover_shards(&mut self, first_pass: bool) -> Result<(), String> {
        let mut start: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_stream()
                .stream_arn(&self.stream_arn)
                .set_exclusive_start_shard_id(start.take())
                .send()
                .await
                .map_err(|err| err.to_string())?;
            let Some(description) = output.stream_description else {
                return Ok(());
            };
            for shard in description.shards.unwrap_or_default() {
                let Some(shard_id) = shard.shard_id else {
                    continue;
                };
                let start = if first_pass {
                    ShardStart::Latest
                } else {
                    ShardStart::TrimHorizon
                };
                self.shards
                    .entry(shard_id)
                    .or_insert(ShardCursor::Pending(start));
            }
            match description.last_evaluated_shard_id {
                Some(next) => start = Some(next),
                None => return Ok(()),
            }
        }
    }

    async fn iterator_for(&self, shard_id: &str, start: &ShardStart) -> Result<Option<String>, String> {
        let request = self
            .client
            .get_shard_iterator()
            .stream_arn(&self.stream_arn)
            .shard_id(shard_id);
        let request = match start {
            ShardStart::Latest => request.shard_iterator_type(ShardIteratorType::Latest),
            ShardStart::TrimHorizon => request.shard_iterator_type(ShardIteratorType::TrimHorizon),
            ShardStart::After(sequence) => request
                .shard_iterator_type(ShardIteratorType::AfterSequenceNumber)
                .sequence_number(sequence),
        };
        let output = request.send().await.map_err(|err| err.to_string())?;
        Ok(output.shard_iterator)
    }

    async fn open_iterator(&mut self, shard_id: &str) -> Option<(String, Option<String>)> {
        match self.shards.get(shard_id)? {
            ShardCursor::Reading {
                iterator,
                last_sequence,
            } => Some((iterator.clone(), last_sequence.clone())),
            ShardCursor::Closed => None,
            ShardCursor::Pending(start) => {
                let start = start.clone();
                let last_sequence = match &start {
                    ShardStart::After(sequence) => Some(sequence.clone()),
                    ShardStart::Latest | ShardStart::TrimHorizon => None,
                };
                match self.iterator_for(shard_id, &start).await {
                    Ok(Some(iterator)) => Some((iterator, last_sequence)),
                    Ok(None) => {
                        self.shards.insert(shard_id.to_owned(), ShardCursor::Closed);
                        None
                    }
                    Err(err) => {
                        warn!(shard_id, error = %err, "failed to open shard iterator");
                        None
                    }
                }
            }
        }
    }

    async fn drain_shard(&mut self, shard_id: &str) -> usize {
        let Some((iterator, last_sequence)) = self.open_iterator(shard_id).await else {
            return 0;
        };
        let output = match self
            .client
            .get_records()
            .shard_iterator(iterator)
            .limit(RECORDS_PER_CALL)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                // The iterator may have expired; reopen after the last record seen.
                warn!(shard_id, error = %err, "failed to read shard records");
                let start = ShardStart::resume(last_sequence, ShardStart::Latest);
                self.shards
                    .insert(shard_id.to_owned(), ShardCursor::Pending(start));
                return 0;
            }
        };

        let mut seen = last_sequence;
        let mut published = 0;
        for record in output.records.unwrap_or_default() {
            if let Some(sequence) = record
                .dynamodb
                .as_ref()
                .and_then(|images| images.sequence_number.clone())
            {
                seen = Some(sequence);
            }
            match change_event(record) {
                Ok(Some(event)) => {
                    if self.sender.send(event).is_ok() {
                        published += 1;
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(shard_id, error = %err, "unreadable stream record"),
            }
        }

        let cursor = match output.next_shard_iterator {
            Some(iterator) => ShardCursor::Reading {
                iterator,
                last_sequence: seen,
            },
            None => ShardCursor::Closed,
        };
        self.shards.insert(shard_id.to_owned(), cursor);
        published
    }
}
