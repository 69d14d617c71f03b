//! In-process key-value store with TTL expiry and a change stream.
//!
//! Tables are ordered maps keyed by `(_pk, _sk)`, so index queries page in key
//! order and a cursor is simply the last key returned. Every successful write
//! is published on a broadcast channel as a [`ChangeEvent`]; subscribers that
//! fall behind lose events, matching the at-least-once gap of a managed stream.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::events::ChangeEvent;
use crate::domain::ports::{
    BATCH_GET_LIMIT, BATCH_WRITE_LIMIT, BatchGetOutput, BatchWriteOutput, IndexQuery,
    KeyValueStore, KeyValueStoreError, QueryPage,
};
use crate::domain::records::{Item, ItemKey, TTL, Table};

/// Capacity of the change-event channel.
pub const CHANGE_CHANNEL_CAPACITY: usize = 1024;

type Rows = BTreeMap<ItemKey, Item>;

/// Limits applied to batched calls; requests beyond them come back
/// unprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub get: usize,
    pub write: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            get: BATCH_GET_LIMIT,
            write: BATCH_WRITE_LIMIT,
        }
    }
}

pub struct InMemoryStore {
    tables: Mutex<HashMap<Table, Rows>>,
    clock: Arc<dyn Clock>,
    limits: BatchLimits,
    changes: broadcast::Sender<ChangeEvent>,
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            tables: Mutex::new(HashMap::new()),
            clock,
            limits: BatchLimits::default(),
            changes,
        }
    }

    #[must_use]
    pub fn with_batch_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = BatchLimits {
            get: limits.get.max(1),
            write: limits.write.max(1),
        };
        self
    }

    /// Receive every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Table, Rows>>, KeyValueStoreError> {
        self.tables
            .lock()
            .map_err(|_| KeyValueStoreError::connection("in-memory store lock poisoned"))
    }

    fn is_live(&self, item: &Item) -> bool {
        item.get(TTL)
            .and_then(serde_json::Value::as_i64)
            .is_none_or(|expires| expires > self.clock.utc().timestamp())
    }

    fn live<'a>(&self, rows: &'a Rows, key: &ItemKey) -> Option<&'a Item> {
        rows.get(key).filter(|item| self.is_live(item))
    }

    /// Insert or replace, returning the event to publish once the lock is
    /// released.
    fn write(&self, table: Table, rows: &mut Rows, item: Item) -> Result<ChangeEvent, KeyValueStoreError> {
        let key = ItemKey::of(&item)
            .ok_or_else(|| KeyValueStoreError::request("item is missing _pk or _sk"))?;
        let previous = rows
            .insert(key, item.clone())
            .filter(|old| self.is_live(old));
        Ok(match previous {
            Some(old) => ChangeEvent::modify(table, old, item),
            None => ChangeEvent::insert(table, item),
        })
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No subscribers is not an error.
            if self.changes.send(event).is_err() {
                debug!("change event dropped without subscribers");
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Item>, KeyValueStoreError> {
        let tables = self.lock()?;
        Ok(tables
            .get(&table)
            .and_then(|rows| self.live(rows, key))
            .cloned())
    }

    async fn put(&self, table: Table, item: Item) -> Result<(), KeyValueStoreError> {
        let event = {
            let mut tables = self.lock()?;
            let rows = tables.entry(table).or_default();
            self.write(table, rows, item)?
        };
        self.publish(vec![event]);
        Ok(())
    }

    async fn put_if_absent(&self, table: Table, item: Item) -> Result<(), KeyValueStoreError> {
        let key = ItemKey::of(&item)
            .ok_or_else(|| KeyValueStoreError::request("item is missing _pk or _sk"))?;
        let event = {
            let mut tables = self.lock()?;
            let rows = tables.entry(table).or_default();
            if self.live(rows, &key).is_some() {
                return Err(KeyValueStoreError::condition_failed(key.pk));
            }
            self.write(table, rows, item)?
        };
        self.publish(vec![event]);
        Ok(())
    }

    async fn batch_get(
        &self,
        table: Table,
        mut keys: Vec<ItemKey>,
    ) -> Result<BatchGetOutput, KeyValueStoreError> {
        let unprocessed = keys.split_off(keys.len().min(self.limits.get));
        let tables = self.lock()?;
        let items = tables
            .get(&table)
            .map(|rows| {
                keys.iter()
                    .filter_map(|key| self.live(rows, key).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(BatchGetOutput { items, unprocessed })
    }

    async fn batch_write(
        &self,
        table: Table,
        mut items: Vec<Item>,
    ) -> Result<BatchWriteOutput, KeyValueStoreError> {
        let unprocessed = items.split_off(items.len().min(self.limits.write));
        let events = {
            let mut tables = self.lock()?;
            let rows = tables.entry(table).or_default();
            items
                .into_iter()
                .map(|item| self.write(table, rows, item))
                .collect::<Result<Vec<_>, _>>()?
        };
        self.publish(events);
        Ok(BatchWriteOutput { unprocessed })
    }

    async fn query(&self, table: Table, query: IndexQuery) -> Result<QueryPage, KeyValueStoreError> {
        let tables = self.lock()?;
        let Some(rows) = tables.get(&table) else {
            return Ok(QueryPage::default());
        };
        let attribute = query.index.attribute();
        let lower = query
            .start_after
            .as_ref()
            .map_or(Bound::Unbounded, Bound::Excluded);
        let mut matches = rows
            .range((lower, Bound::Unbounded))
            .map(|(_, item)| item)
            .filter(|item| self.is_live(item))
            .filter(|item| item.get(attribute).and_then(serde_json::Value::as_str) == Some(query.value.as_str()));

        let limit = query.limit.unwrap_or(usize::MAX);
        let items: Vec<Item> = matches.by_ref().take(limit).cloned().collect();
        let last_key = if matches.next().is_some() {
            items.last().and_then(ItemKey::of)
        } else {
            None
        };
        Ok(QueryPage { items, last_key })
    }
}
