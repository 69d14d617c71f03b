//! Background consumers: the change stream feeding the aggregators and the
//! review queue feeding the sentiment gate.
//!
//! Each worker exposes `handle` for one batch and `run` for the receive
//! loop. Failures are logged with the batch size and the batch is dropped;
//! redelivery belongs to whatever hosts the stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use crate::domain::events::ChangeEvent;
use crate::domain::ports::{KeyValueStore, QueuedMessage};
use crate::domain::{
    AggregateOutcome, InfluenceAggregator, ReviewOutcome, SentimentGate, StreakAggregator, TraceId,
};

/// Batching limits for a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Most events handed to one `handle` call.
    pub max_batch: usize,
    /// How long a partial batch may wait before it is flushed.
    pub flush_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch: 100,
            flush_interval: Duration::from_millis(250),
        }
    }
}

/// Outcome of one change batch across both aggregators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeBatchOutcome {
    pub streaks: Option<AggregateOutcome>,
    pub influence: Option<AggregateOutcome>,
}

pub struct ChangeStreamWorker<S: ?Sized> {
    streaks: StreakAggregator<S>,
    influence: InfluenceAggregator<S>,
    config: BatchConfig,
}

impl<S> ChangeStreamWorker<S>
where
    S: KeyValueStore + ?Sized,
{
    pub fn new(
        streaks: StreakAggregator<S>,
        influence: InfluenceAggregator<S>,
        config: BatchConfig,
    ) -> Self {
        Self {
            streaks,
            influence,
            config: BatchConfig {
                max_batch: config.max_batch.max(1),
                ..config
            },
        }
    }

    /// Run both aggregators over one batch. A failing aggregator does not
    /// stop the other.
    pub async fn handle(&self, events: &[ChangeEvent]) -> ChangeBatchOutcome {
        TraceId::scope(TraceId::generate(), async {
            let streaks = self.streaks.handle_batch(events).await.inspect_err(|err| {
                error!(batch = events.len(), error = %err.message(), "streak aggregation failed");
            });
            let influence = self.influence.handle_batch(events).await.inspect_err(|err| {
                error!(batch = events.len(), error = %err.message(), "influence aggregation failed");
            });
            ChangeBatchOutcome {
                streaks: streaks.ok(),
                influence: influence.ok(),
            }
        })
        .await
    }

    /// Consume `changes` until every sender is gone, flushing when a batch
    /// fills or the flush interval elapses.
    pub async fn run(&self, mut changes: broadcast::Receiver<ChangeEvent>) {
        let mut pending = Vec::with_capacity(self.config.max_batch);
        let mut ticker = interval(self.config.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                received = changes.recv() => match received {
                    Ok(event) => {
                        pending.push(event);
                        if pending.len() >= self.config.max_batch {
                            self.handle(&std::mem::take(&mut pending)).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change stream lagged; events lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = ticker.tick() => {
                    if !pending.is_empty() {
                        self.handle(&std::mem::take(&mut pending)).await;
                    }
                }
            }
        }
        if !pending.is_empty() {
            self.handle(&pending).await;
        }
        info!("change stream closed");
    }
}

pub struct ReviewWorker<S: ?Sized> {
    gate: SentimentGate<S>,
    max_batch: usize,
}

impl<S> ReviewWorker<S>
where
    S: KeyValueStore + ?Sized,
{
    pub fn new(gate: SentimentGate<S>, max_batch: usize) -> Self {
        Self {
            gate,
            max_batch: max_batch.max(1),
        }
    }

    /// Review one batch of queued entries.
    pub async fn handle(&self, messages: Vec<QueuedMessage>) -> Option<ReviewOutcome> {
        let batch = messages.len();
        TraceId::scope(TraceId::generate(), self.gate.review(messages))
            .await
            .inspect_err(|err| error!(batch, error = %err.message(), "sentiment review failed"))
            .ok()
    }

    /// Drain `queue` until the last sender is dropped.
    pub async fn run(&self, mut queue: mpsc::Receiver<QueuedMessage>) {
        let mut batch = Vec::with_capacity(self.max_batch);
        while queue.recv_many(&mut batch, self.max_batch).await > 0 {
            self.handle(std::mem::take(&mut batch)).await;
        }
        info!("review queue closed");
    }
}

/// Spawn the change-stream worker onto the current runtime.
pub fn spawn_change_worker<S>(
    worker: Arc<ChangeStreamWorker<S>>,
    changes: broadcast::Receiver<ChangeEvent>,
) -> tokio::task::JoinHandle<()>
where
    S: KeyValueStore + ?Sized + 'static,
{
    tokio::spawn(async move { worker.run(changes).await })
}

pub fn spawn_review_worker<S>(
    worker: Arc<ReviewWorker<S>>,
    queue: mpsc::Receiver<QueuedMessage>,
) -> tokio::task::JoinHandle<()>
where
    S: KeyValueStore + ?Sized + 'static,
{
    tokio::spawn(async move { worker.run(queue).await })
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
