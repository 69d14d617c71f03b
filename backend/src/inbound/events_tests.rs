//! Worker tests over the in-memory store.

use super::*;
use crate::domain::ports::{EntryQueue, IndexQuery, SecondaryIndex};
use crate::domain::records::{
    EntryRecord, InfluenceScoreRecord, ReactionRecord, StreakRecord, Table, from_item, to_item,
};
use crate::domain::{EntryId, EntryIndex, JournalEntry, SentimentAnalyzer, UserId};
use crate::outbound::persistence::InMemoryStore;
use crate::outbound::queue::ChannelEntryQueue;
use crate::test_support::FixedClock;
use chrono::{NaiveDate, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

const ADA: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
const BOB: &str = "9b2d7c1e-4f3a-4e8b-a1c2-d3e4f5a6b7c8";

struct Harness {
    store: Arc<InMemoryStore>,
    clock: Arc<dyn Clock>,
}

impl Harness {
    fn change_worker(&self, config: BatchConfig) -> ChangeStreamWorker<InMemoryStore> {
        ChangeStreamWorker::new(
            StreakAggregator::new(self.store.clone(), self.clock.clone()),
            InfluenceAggregator::new(self.store.clone()),
            config,
        )
    }

    fn review_worker(&self) -> ReviewWorker<InMemoryStore> {
        ReviewWorker::new(
            SentimentGate::new(self.store.clone(), SentimentAnalyzer::default()),
            10,
        )
    }

    async fn streak_of(&self, user: &str) -> Option<StreakRecord> {
        let key = StreakRecord::key(&UserId::new(user).expect("valid id"));
        let item = self.store.get(Table::Journal, &key).await.expect("get")?;
        Some(from_item(item).expect("streak record"))
    }

    async fn influence_of(&self, user: &str) -> Option<u64> {
        let key = InfluenceScoreRecord::key(&UserId::new(user).expect("valid id"));
        let item = self.store.get(Table::Journal, &key).await.expect("get")?;
        let record: InfluenceScoreRecord = from_item(item).expect("score record");
        Some(record.score)
    }
}

#[fixture]
fn harness() -> Harness {
    let now = Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, 0).single().expect("valid time");
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
    Harness {
        store: Arc::new(InMemoryStore::new(clock.clone())),
        clock,
    }
}

fn entry(author: &str, index: u8, text: &str) -> JournalEntry {
    JournalEntry {
        user_id: UserId::new(author).expect("valid id"),
        id: EntryId::new("sub-1").expect("valid id"),
        index: EntryIndex::try_from(i64::from(index)).expect("valid index"),
        text: text.to_owned(),
        written_on: NaiveDate::from_ymd_opt(2024, 5, 3).expect("valid date"),
        shared_on: None,
    }
}

fn reaction(creator: &str, liked_by: &str) -> crate::domain::records::Item {
    let record = ReactionRecord::new(
        &UserId::new(creator).expect("valid id"),
        &EntryId::new("sub-1").expect("valid id"),
        EntryIndex::try_from(0_i64).expect("valid index"),
        &UserId::new(liked_by).expect("valid id"),
    );
    to_item(&record).expect("reaction item")
}

fn drain(changes: &mut broadcast::Receiver<ChangeEvent>) -> Vec<ChangeEvent> {
    std::iter::from_fn(|| changes.try_recv().ok()).collect()
}

#[rstest]
#[tokio::test]
async fn one_batch_updates_streaks_and_influence(harness: Harness) {
    let mut changes = harness.store.subscribe();
    for index in 0..3 {
        let item = to_item(&EntryRecord::from_entry(&entry(ADA, index, "tea"))).expect("item");
        harness.store.put(Table::Journal, item).await.expect("put");
    }
    harness.store.put(Table::Journal, reaction(ADA, BOB)).await.expect("put");
    let events = drain(&mut changes);
    assert_eq!(events.len(), 4);

    let outcome = harness.change_worker(BatchConfig::default()).handle(&events).await;
    assert_eq!(outcome.streaks.map(|o| o.updated), Some(1));
    assert_eq!(outcome.influence.map(|o| o.updated), Some(1));

    let streak = harness.streak_of(ADA).await.expect("streak written");
    assert_eq!(streak.current_streak, 1);
    assert_eq!(harness.influence_of(ADA).await, Some(1));
    assert!(harness.streak_of(BOB).await.is_none());
}

#[rstest]
#[tokio::test]
async fn run_flushes_the_tail_when_the_stream_closes(harness: Harness) {
    let (sender, receiver) = broadcast::channel(16);
    let worker = Arc::new(harness.change_worker(BatchConfig {
        max_batch: 2,
        flush_interval: Duration::from_secs(3600),
    }));
    let task = spawn_change_worker(worker, receiver);

    for liker in [BOB, ADA, BOB] {
        // Self-likes count too; the ledger does not filter them.
        let reaction_item = reaction(ADA, liker);
        sender
            .send(ChangeEvent::insert(Table::Journal, reaction_item))
            .expect("subscriber present");
    }
    drop(sender);
    task.await.expect("worker finished");

    assert_eq!(harness.influence_of(ADA).await, Some(3));
}

#[rstest]
#[tokio::test]
async fn review_publishes_only_non_negative_entries(harness: Harness) {
    let (queue, receiver) = ChannelEntryQueue::channel(8);
    queue.enqueue(&entry(ADA, 0, "lovely sunny walk")).await.expect("queued");
    queue.enqueue(&entry(ADA, 1, "nazi")).await.expect("queued");
    drop(queue);

    harness.review_worker().run(receiver).await;

    let shared = harness
        .store
        .query(
            Table::Journal,
            IndexQuery::new(SecondaryIndex::Gsi2, "social/2024-05-03"),
        )
        .await
        .expect("query");
    assert_eq!(shared.items.len(), 1);
    assert_eq!(shared.items[0]["entry"], "lovely sunny walk");
}

#[rstest]
#[tokio::test]
async fn review_failures_are_contained(harness: Harness) {
    let outcome = harness
        .review_worker()
        .handle(vec![QueuedMessage {
            message_id: "m-1".to_owned(),
            body: "not json".to_owned(),
        }])
        .await
        .expect("malformed messages do not fail the batch");
    assert_eq!(outcome.malformed, 1);
    assert_eq!(outcome.published, 0);
}
