//! In-memory wiring of the whole service for integration tests.
//!
//! Background workers are not spawned. Tests call [`JournalStack::pump`] to
//! drain the review queue and the change stream so aggregates settle
//! deterministically before the next assertion.

use std::sync::{Arc, Mutex};

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tokio::sync::{broadcast, mpsc};
use zeroize::Zeroizing;

use gratitude_backend::Trace;
use gratitude_backend::domain::ports::{KeyValueStore, QueuedMessage};
use gratitude_backend::domain::{
    AccountService, ChangeEvent, InfluenceAggregator, JournalService, LoginCollaborators,
    LoginPolicy, OtpLoginService, ReactionService, ScoreService, SentimentAnalyzer, SentimentGate,
    StreakAggregator,
};
use gratitude_backend::inbound::events::{BatchConfig, ChangeStreamWorker, ReviewWorker};
use gratitude_backend::inbound::http::state::HttpState;
use gratitude_backend::inbound::http::{configure, json_error_handler};
use gratitude_backend::outbound::crypto::{AesGcmCipher, JwtSessionTokens, TokenSettings};
use gratitude_backend::outbound::persistence::InMemoryStore;
use gratitude_backend::outbound::queue::ChannelEntryQueue;
use gratitude_backend::test_support::{MutableClock, RecordingMailer};

type Store = dyn KeyValueStore;

/// Monday 6 May 2024, 09:00 UTC.
pub fn start_of_test() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0)
        .single()
        .expect("valid start time")
}

pub struct JournalStack {
    pub clock: Arc<MutableClock>,
    pub mailer: Arc<RecordingMailer>,
    pub http_state: HttpState,
    changes: Mutex<broadcast::Receiver<ChangeEvent>>,
    reviews: Mutex<mpsc::Receiver<QueuedMessage>>,
    change_worker: ChangeStreamWorker<Store>,
    review_worker: ReviewWorker<Store>,
}

impl JournalStack {
    pub fn new() -> Self {
        let clock = Arc::new(MutableClock::new(start_of_test()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let memory = InMemoryStore::new(dyn_clock.clone());
        let changes = memory.subscribe();
        let store: Arc<Store> = Arc::new(memory);
        let (queue, reviews) = ChannelEntryQueue::channel(64);
        let mailer = Arc::new(RecordingMailer::default());

        let sessions = Arc::new(JwtSessionTokens::new(
            TokenSettings {
                secret: b"integration-secret".to_vec(),
                issuer: "gratitude".to_owned(),
                audience: "gratitude-app".to_owned(),
                ttl: TimeDelta::hours(12),
            },
            dyn_clock.clone(),
        ));
        let login = OtpLoginService::new(
            store.clone(),
            LoginCollaborators {
                cipher: Arc::new(AesGcmCipher::new(&Zeroizing::new([7_u8; 32]))),
                sessions: sessions.clone(),
                mailer: mailer.clone(),
                clock: dyn_clock.clone(),
            },
            LoginPolicy::default(),
        );
        let journal = Arc::new(
            JournalService::new(store.clone(), Arc::new(queue), dyn_clock.clone())
                .with_social_page_size(2),
        );
        let http_state = HttpState {
            accounts: Arc::new(AccountService::new(store.clone(), dyn_clock.clone())),
            login: Arc::new(login),
            journal: journal.clone(),
            journal_query: journal,
            reactions: Arc::new(ReactionService::new(store.clone())),
            scores: Arc::new(ScoreService::new(store.clone())),
            sessions,
        };

        let change_worker = ChangeStreamWorker::new(
            StreakAggregator::new(store.clone(), dyn_clock),
            InfluenceAggregator::new(store.clone()),
            BatchConfig::default(),
        );
        let review_worker =
            ReviewWorker::new(SentimentGate::new(store, SentimentAnalyzer::default()), 10);

        Self {
            clock,
            mailer,
            http_state,
            changes: Mutex::new(changes),
            reviews: Mutex::new(reviews),
            change_worker,
            review_worker,
        }
    }

    /// Review queued shares, then fold every pending change into the
    /// aggregates.
    pub async fn pump(&self) {
        let queued = {
            let mut reviews = self.reviews.lock().expect("review queue lock");
            std::iter::from_fn(|| reviews.try_recv().ok()).collect::<Vec<_>>()
        };
        if !queued.is_empty() {
            self.review_worker.handle(queued).await;
        }

        let events = {
            let mut changes = self.changes.lock().expect("change stream lock");
            std::iter::from_fn(|| changes.try_recv().ok()).collect::<Vec<_>>()
        };
        if !events.is_empty() {
            self.change_worker.handle(&events).await;
        }
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(TimeDelta::days(days));
    }
}

/// The production route table over `state`.
pub fn app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .configure(configure)
}
