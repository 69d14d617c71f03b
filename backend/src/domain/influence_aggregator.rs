//! Influence aggregator: credits creators for new reactions.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::events::{ChangeEvent, reacted_creator};
use crate::domain::ports::KeyValueStore;
use crate::domain::records::{InfluenceScoreRecord, Table};
use crate::domain::service_support::{
    batch_get_all, batch_write_all, decode, encode, map_store_error,
};
use crate::domain::streak_aggregator::AggregateOutcome;
use crate::domain::{Error, InfluenceTally};

pub struct InfluenceAggregator<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> InfluenceAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: ?Sized> InfluenceAggregator<S>
where
    S: KeyValueStore,
{
    /// Add each creator's new reactions in `events` to their stored score.
    pub async fn handle_batch(&self, events: &[ChangeEvent]) -> Result<AggregateOutcome, Error> {
        let tally: InfluenceTally = events.iter().filter_map(reacted_creator).collect();
        if tally.is_empty() {
            return Ok(AggregateOutcome::default());
        }

        let keys = tally.creators().map(InfluenceScoreRecord::key).collect();
        let stored = batch_get_all(&*self.store, Table::Journal, keys)
            .await
            .map_err(map_store_error)?;
        let unread: HashSet<String> = stored.unprocessed.into_iter().map(|key| key.pk).collect();
        if !unread.is_empty() {
            warn!(count = unread.len(), "influence lookup left creators unread");
        }
        let mut scores = HashMap::new();
        for item in stored.items {
            let record: InfluenceScoreRecord = decode(item)?;
            scores.insert(record.pk, record.score);
        }

        let mut items = Vec::with_capacity(tally.len());
        for creator in tally.creators() {
            let pk = creator.to_string();
            if unread.contains(&pk) {
                continue;
            }
            let score = tally.apply(creator, scores.get(&pk).copied());
            items.push(encode(&InfluenceScoreRecord::new(creator, score))?);
        }

        let attempted = items.len();
        let written = batch_write_all(&*self.store, Table::Journal, items)
            .await
            .map_err(map_store_error)?;
        if !written.unprocessed.is_empty() {
            warn!(
                count = written.unprocessed.len(),
                "influence update left records unwritten"
            );
        }
        let outcome = AggregateOutcome {
            updated: attempted.saturating_sub(written.unprocessed.len()),
            skipped: unread.len() + written.unprocessed.len(),
        };
        info!(
            updated = outcome.updated,
            skipped = outcome.skipped,
            "influence scores aggregated"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        BatchGetOutput, BatchWriteOutput, KeyValueStoreError, MockKeyValueStore,
    };
    use crate::domain::records::{Item, ReactionRecord, to_item};
    use crate::domain::{EntryId, EntryIndex, ErrorCode, UserId};
    use rstest::rstest;

    const ADA: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
    const BOB: &str = "9b2d7c1e-4f3a-4e8b-a1c2-d3e4f5a6b7c8";
    const CAT: &str = "0c1d2e3f-4a5b-4c6d-8e7f-901a2b3c4d5e";

    fn reaction(creator: &str, liked_by: &str) -> Item {
        let record = ReactionRecord::new(
            &UserId::new(creator).expect("valid user id"),
            &EntryId::new("entry-1").expect("valid entry id"),
            EntryIndex::try_from(0_i64).expect("valid index"),
            &UserId::new(liked_by).expect("valid user id"),
        );
        to_item(&record).expect("encode reaction")
    }

    fn score_item(creator: &str, score: u64) -> Item {
        let creator = UserId::new(creator).expect("valid user id");
        to_item(&InfluenceScoreRecord::new(&creator, score)).expect("encode score")
    }

    #[rstest]
    #[tokio::test]
    async fn adds_batch_counts_to_stored_scores() {
        let mut store = MockKeyValueStore::new();
        let stored = score_item(ADA, 10);
        store
            .expect_batch_get()
            .withf(|_, keys| keys.len() == 2 && keys.iter().all(|key| key.sk == "INFLUENCE_SCORE"))
            .times(1)
            .return_once(move |_, _| {
                Ok(BatchGetOutput {
                    items: vec![stored],
                    unprocessed: Vec::new(),
                })
            });
        store
            .expect_batch_write()
            .withf(|table, items| {
                let score = |user: &str| {
                    items
                        .iter()
                        .find(|item| item["_pk"] == user)
                        .map(|item| item["score"].clone())
                };
                *table == Table::Journal
                    && items.len() == 2
                    && score(ADA) == Some(12.into())
                    && score(BOB) == Some(1.into())
            })
            .times(1)
            .return_once(|_, _| Ok(BatchWriteOutput::default()));

        let events = [
            ChangeEvent::insert(Table::Journal, reaction(ADA, BOB)),
            ChangeEvent::insert(Table::Journal, reaction(ADA, CAT)),
            ChangeEvent::insert(Table::Journal, reaction(BOB, CAT)),
        ];
        let outcome = InfluenceAggregator::new(Arc::new(store))
            .handle_batch(&events)
            .await
            .expect("batch applied");
        assert_eq!(outcome, AggregateOutcome { updated: 2, skipped: 0 });
    }

    #[rstest]
    #[tokio::test]
    async fn re_reactions_credit_no_one() {
        let mut store = MockKeyValueStore::new();
        store.expect_batch_get().never();
        store.expect_batch_write().never();

        let events = [ChangeEvent::modify(
            Table::Journal,
            reaction(ADA, BOB),
            reaction(ADA, BOB),
        )];
        let outcome = InfluenceAggregator::new(Arc::new(store))
            .handle_batch(&events)
            .await
            .expect("batch applied");
        assert_eq!(outcome, AggregateOutcome::default());
    }

    #[rstest]
    #[tokio::test]
    async fn unwritten_scores_are_reported_as_skipped() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_batch_get()
            .return_once(|_, _| Ok(BatchGetOutput::default()));
        store.expect_batch_write().return_once(|_, items| {
            Ok(BatchWriteOutput { unprocessed: items })
        });

        let events = [ChangeEvent::insert(Table::Journal, reaction(ADA, BOB))];
        let outcome = InfluenceAggregator::new(Arc::new(store))
            .handle_batch(&events)
            .await
            .expect("batch applied");
        assert_eq!(outcome, AggregateOutcome { updated: 0, skipped: 1 });
    }

    #[rstest]
    #[tokio::test]
    async fn read_failures_abort_the_batch() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_batch_get()
            .return_once(|_, _| Err(KeyValueStoreError::connection("down")));
        store.expect_batch_write().never();

        let events = [ChangeEvent::insert(Table::Journal, reaction(ADA, BOB))];
        let err = InfluenceAggregator::new(Arc::new(store))
            .handle_batch(&events)
            .await
            .expect_err("batch fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
