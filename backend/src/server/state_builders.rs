//! Builders wiring the store, adapters and services into HTTP state and
//! background workers.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use mockable::Clock;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use gratitude_backend::domain::ports::{KeyValueStore, QueuedMessage};
use gratitude_backend::domain::{
    AccountService, ChangeEvent, InfluenceAggregator, JournalService, LoginCollaborators,
    OtpLoginService, ReactionService, ScoreService, SentimentAnalyzer, SentimentGate,
    StreakAggregator,
};
use gratitude_backend::inbound::events::{ChangeStreamWorker, ReviewWorker};
use gratitude_backend::inbound::http::state::HttpState;
use gratitude_backend::outbound::crypto::{AesGcmCipher, JwtSessionTokens};
use gratitude_backend::outbound::mail::LoggingMailer;
#[cfg(feature = "dynamo")]
use gratitude_backend::outbound::persistence::{
    CHANGE_CHANNEL_CAPACITY, DynamoStore, DynamoStreamPoller, DynamoTables,
};
use gratitude_backend::outbound::persistence::InMemoryStore;
use gratitude_backend::outbound::queue::{ChannelEntryQueue, DEFAULT_QUEUE_CAPACITY};
use gratitude_backend::settings::StoreSelection;

use super::ServerConfig;

type Store = dyn KeyValueStore;

/// Everything the server needs once the adapters are connected.
pub(crate) struct Wiring {
    pub(crate) http_state: HttpState,
    pub(crate) change_worker: Arc<ChangeStreamWorker<Store>>,
    pub(crate) changes: broadcast::Receiver<ChangeEvent>,
    /// Task publishing external change records onto `changes`, if any.
    pub(crate) change_feed: Option<BoxFuture<'static, ()>>,
    pub(crate) review_worker: Arc<ReviewWorker<Store>>,
    pub(crate) review_queue: mpsc::Receiver<QueuedMessage>,
}

struct StoreHandle {
    store: Arc<Store>,
    changes: broadcast::Receiver<ChangeEvent>,
    change_feed: Option<BoxFuture<'static, ()>>,
}

async fn build_store(config: &ServerConfig) -> std::io::Result<StoreHandle> {
    match &config.runtime.store {
        StoreSelection::InMemory => {
            let store = InMemoryStore::new(config.clock.clone());
            let changes = store.subscribe();
            warn!("using the in-memory store; data does not survive a restart");
            Ok(StoreHandle {
                store: Arc::new(store),
                changes,
                change_feed: None,
            })
        }
        #[cfg(feature = "dynamo")]
        StoreSelection::Dynamo { journal, auth } => {
            let tables = DynamoTables {
                auth: auth.clone(),
                journal: journal.clone(),
            };
            let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let store = DynamoStore::from_config(&aws, tables, config.clock.clone());
            let stream_arn = store
                .journal_stream_arn()
                .await
                .map_err(std::io::Error::other)?;
            let (sender, changes) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
            let poller = DynamoStreamPoller::from_config(&aws, stream_arn, sender);
            Ok(StoreHandle {
                store: Arc::new(store),
                changes,
                change_feed: Some(Box::pin(poller.run())),
            })
        }
        #[cfg(not(feature = "dynamo"))]
        StoreSelection::Dynamo { .. } => Err(std::io::Error::other(
            "DynamoDB tables are configured but the `dynamo` feature is disabled",
        )),
    }
}

fn build_http_state(
    config: &ServerConfig,
    store: &Arc<Store>,
    queue: ChannelEntryQueue,
) -> HttpState {
    let clock: Arc<dyn Clock> = config.clock.clone();
    let runtime = &config.runtime;
    let sessions = Arc::new(JwtSessionTokens::new(runtime.tokens.clone(), clock.clone()));
    let mailer = LoggingMailer::new(runtime.source_email.to_string());

    let login = OtpLoginService::new(
        store.clone(),
        LoginCollaborators {
            cipher: Arc::new(AesGcmCipher::new(&runtime.otp_key)),
            sessions: sessions.clone(),
            mailer: Arc::new(mailer),
            clock: clock.clone(),
        },
        runtime.login,
    );
    let journal = Arc::new(
        JournalService::new(store.clone(), Arc::new(queue), clock.clone())
            .with_social_page_size(runtime.social_page_size),
    );

    HttpState {
        accounts: Arc::new(AccountService::new(store.clone(), clock)),
        login: Arc::new(login),
        journal: journal.clone(),
        journal_query: journal,
        reactions: Arc::new(ReactionService::new(store.clone())),
        scores: Arc::new(ScoreService::new(store.clone())),
        sessions,
    }
}

/// Connect the store and build every service and worker.
pub(crate) async fn build_wiring(config: &ServerConfig) -> std::io::Result<Wiring> {
    let StoreHandle {
        store,
        changes,
        change_feed,
    } = build_store(config).await?;
    let (queue, review_queue) = ChannelEntryQueue::channel(DEFAULT_QUEUE_CAPACITY);
    let http_state = build_http_state(config, &store, queue);

    let stream = config.runtime.stream;
    let change_worker = Arc::new(ChangeStreamWorker::new(
        StreakAggregator::new(store.clone(), config.clock.clone()),
        InfluenceAggregator::new(store.clone()),
        stream,
    ));
    let review_worker = Arc::new(ReviewWorker::new(
        SentimentGate::new(store, SentimentAnalyzer::default()),
        stream.max_batch,
    ));

    Ok(Wiring {
        http_state,
        change_worker,
        changes,
        change_feed,
        review_worker,
        review_queue,
    })
}
