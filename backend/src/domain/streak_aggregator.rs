//! Streak aggregator: advances each author's streak from journal inserts.
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::events::{ChangeEvent, submitted_entry_author};
use crate::domain::ports::KeyValueStore;
use crate::domain::records::{StreakRecord, Table};
use crate::domain::service_support::{
    batch_get_all, batch_write_all, decode, encode, map_store_error,
};
use crate::domain::{Error, Streak, UserId};

/// Counts from one aggregated batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Records written.
    pub updated: usize,
    /// Records left alone because a read or write went unprocessed.
    pub skipped: usize,
}

pub struct StreakAggregator<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ?Sized> StreakAggregator<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl<S: ?Sized> StreakAggregator<S>
where
    S: KeyValueStore,
{
    /// Apply one batch of change events.
    ///
    /// Several entries by one author in a batch advance their streak once.
    pub async fn handle_batch(&self, events: &[ChangeEvent]) -> Result<AggregateOutcome, Error> {
        let authors: BTreeSet<UserId> = events.iter().filter_map(submitted_entry_author).collect();
        if authors.is_empty() {
            return Ok(AggregateOutcome::default());
        }
        let today = self.clock.utc().date_naive();

        let keys = authors.iter().map(StreakRecord::key).collect();
        let stored = batch_get_all(&*self.store, Table::Journal, keys)
            .await
            .map_err(map_store_error)?;
        let unread: HashSet<String> = stored.unprocessed.into_iter().map(|key| key.pk).collect();
        if !unread.is_empty() {
            warn!(count = unread.len(), "streak lookup left users unread");
        }
        let mut prior = HashMap::new();
        for item in stored.items {
            let record: StreakRecord = decode(item)?;
            prior.insert(record.pk.clone(), record.streak());
        }

        let mut items = Vec::new();
        for author in &authors {
            let pk = author.to_string();
            if unread.contains(&pk) {
                continue;
            }
            let streak = Streak::advance(prior.remove(&pk), today);
            items.push(encode(&StreakRecord::from_streak(author, &streak))?);
        }

        let attempted = items.len();
        let written = batch_write_all(&*self.store, Table::Journal, items)
            .await
            .map_err(map_store_error)?;
        if !written.unprocessed.is_empty() {
            warn!(count = written.unprocessed.len(), "streak update left records unwritten");
        }
        let outcome = AggregateOutcome {
            updated: attempted.saturating_sub(written.unprocessed.len()),
            skipped: unread.len() + written.unprocessed.len(),
        };
        info!(
            updated = outcome.updated,
            skipped = outcome.skipped,
            "streaks aggregated"
        );
        Ok(outcome)
    }
}
