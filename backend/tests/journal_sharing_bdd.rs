//! Behaviour tests for sharing, reactions and streaks through the driving
//! ports, with the event workers drained between steps.

#[expect(
    dead_code,
    reason = "Shared stack exposes HTTP helpers used by other integration suites."
)]
#[path = "support/journal_stack.rs"]
mod journal_stack;

use std::sync::Arc;

use gratitude_backend::domain::ports::{
    JournalCommand, JournalQuery, Reaction, ReactionLedger, ScoreQuery, UserAccounts,
};
use gratitude_backend::domain::{
    DisplayName, Email, EntryId, EntryIndex, Registration, SocialPage, Submission, UserId,
};
use journal_stack::JournalStack;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};

const NEGATIVE_ENTRY: &str = "A terrible awful commute";

#[derive(Clone)]
struct RuntimeHandle(Arc<tokio::runtime::Runtime>);

#[derive(Default, ScenarioState)]
struct SharingWorld {
    runtime: Slot<RuntimeHandle>,
    stack: Slot<Arc<JournalStack>>,
    writers: Slot<(UserId, UserId)>,
    submission: Slot<EntryId>,
    feed: Slot<SocialPage>,
}

impl SharingWorld {
    fn run<T, F>(&self, operation: impl FnOnce(Arc<JournalStack>) -> F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let runtime = self.runtime.get().expect("runtime should be set");
        let stack = self.stack.get().expect("stack should be set");
        runtime.0.block_on(operation(stack))
    }

    fn first_writer(&self) -> UserId {
        self.writers.get().expect("writers registered").0
    }

    fn second_writer(&self) -> UserId {
        self.writers.get().expect("writers registered").1
    }

    fn submit(&self, texts: [&str; 3]) -> EntryId {
        let writer = self.first_writer();
        let submission = Submission::try_from_parts(None, texts.map(|text| Some(text.to_owned())))
            .expect("valid submission");
        self.run(|stack| async move {
            let id = stack
                .http_state
                .journal
                .submit(&writer, submission)
                .await
                .expect("submission stored");
            stack.pump().await;
            id
        })
    }

    fn score(&self, writer: UserId, streak: bool) -> u64 {
        self.run(|stack| async move {
            let scores = &stack.http_state.scores;
            if streak {
                u64::from(scores.streak(&writer).await.expect("streak readable"))
            } else {
                scores.influence(&writer).await.expect("influence readable")
            }
        })
    }
}

#[fixture]
fn world() -> SharingWorld {
    SharingWorld::default()
}

async fn register(stack: &JournalStack, email: &str, name: &str) -> UserId {
    stack
        .http_state
        .accounts
        .register(Registration {
            email: Email::new(email).expect("valid email"),
            display_name: DisplayName::new(name).expect("valid display name"),
        })
        .await
        .expect("registration succeeds")
}

#[given("a journal with two registered writers")]
fn a_journal_with_two_registered_writers(world: &SharingWorld) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    world.runtime.set(RuntimeHandle(Arc::new(runtime)));
    world.stack.set(Arc::new(JournalStack::new()));
    let writers = world.run(|stack| async move {
        let first = register(&stack, "ada@example.com", "Ada").await;
        let second = register(&stack, "sam@example.com", "Sam").await;
        (first, second)
    });
    world.writers.set(writers);
}

#[when("the first writer submits a mixed set of entries")]
fn the_first_writer_submits_a_mixed_set_of_entries(world: &SharingWorld) {
    let id = world.submit(["Grateful for good coffee", NEGATIVE_ENTRY, "Kind friends"]);
    world.submission.set(id);
}

#[when("the first writer shares today's entries")]
fn the_first_writer_shares_todays_entries(world: &SharingWorld) {
    let writer = world.first_writer();
    let outcome = world.run(|stack| async move {
        stack
            .http_state
            .journal
            .share_today(&writer)
            .await
            .expect("share succeeds")
    });
    assert_eq!(outcome.queued, 3);
}

#[when("pending events are processed")]
fn pending_events_are_processed(world: &SharingWorld) {
    world.run(|stack| async move { stack.pump().await });
}

#[when("the second writer likes the first writer's opening entry")]
fn the_second_writer_likes_the_opening_entry(world: &SharingWorld) {
    let reaction = Reaction {
        creator_id: world.first_writer(),
        entry_id: world.submission.get().expect("submission stored"),
        index: EntryIndex::try_from(0).expect("valid index"),
        liked_by: world.second_writer(),
    };
    world.run(|stack| async move {
        stack
            .http_state
            .reactions
            .react(reaction)
            .await
            .expect("reaction stored");
    });
}

#[when("the first writer writes on {days} consecutive days")]
fn the_first_writer_writes_on_consecutive_days(world: &SharingWorld, days: u32) {
    for day in 0..days {
        if day > 0 {
            world.run(|stack| async move { stack.advance_days(1) });
        }
        world.submit(["Morning light", "A good book", "Tea"]);
    }
}

#[when("the first writer writes again after skipping a day")]
fn the_first_writer_writes_again_after_skipping_a_day(world: &SharingWorld) {
    world.run(|stack| async move { stack.advance_days(2) });
    world.submit(["Rain on the window", "Soup", "An early night"]);
}

#[then("the social feed shows {count} entries")]
fn the_social_feed_shows_entries(world: &SharingWorld, count: usize) {
    let page = world.run(|stack| async move {
        stack
            .http_state
            .journal_query
            .social_feed(None)
            .await
            .expect("feed readable")
    });
    assert_eq!(page.entries.len(), count);
    world.feed.set(page);
}

#[then("the negative entry is not on the feed")]
fn the_negative_entry_is_not_on_the_feed(world: &SharingWorld) {
    let page = world.feed.get().expect("feed read");
    assert!(page.entries.iter().all(|entry| entry.entry != NEGATIVE_ENTRY));
}

#[then("the first writer's influence is {score}")]
fn the_first_writers_influence_is(world: &SharingWorld, score: u64) {
    assert_eq!(world.score(world.first_writer(), false), score);
}

#[then("the second writer's influence is {score}")]
fn the_second_writers_influence_is(world: &SharingWorld, score: u64) {
    assert_eq!(world.score(world.second_writer(), false), score);
}

#[then("the first writer's streak is {days}")]
fn the_first_writers_streak_is(world: &SharingWorld, days: u64) {
    assert_eq!(world.score(world.first_writer(), true), days);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/journal_sharing.feature",
    name = "Only positive entries reach the social feed"
)]
fn only_positive_entries_reach_the_social_feed(world: SharingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/journal_sharing.feature",
    name = "Likes raise the creator's influence once per liker"
)]
fn likes_raise_influence_once_per_liker(world: SharingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/journal_sharing.feature",
    name = "Streaks count consecutive days and reset after a gap"
)]
fn streaks_reset_after_a_gap(world: SharingWorld) {
    let _ = world;
}
