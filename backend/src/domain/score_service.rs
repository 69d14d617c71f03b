//! Read side of the streak and influence aggregates.
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{KeyValueStore, ScoreQuery};
use crate::domain::records::{InfluenceScoreRecord, StreakRecord, Table};
use crate::domain::service_support::{decode, map_store_error};
use crate::domain::{Error, UserId};

#[derive(Clone)]
pub struct ScoreService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> ScoreService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ?Sized> ScoreQuery for ScoreService<S>
where
    S: KeyValueStore,
{
    async fn influence(&self, user_id: &UserId) -> Result<u64, Error> {
        let item = self
            .store
            .get(Table::Journal, &InfluenceScoreRecord::key(user_id))
            .await
            .map_err(map_store_error)?;
        item.map_or(Ok(0), |item| {
            decode::<InfluenceScoreRecord>(item).map(|record| record.score)
        })
    }

    async fn streak(&self, user_id: &UserId) -> Result<u32, Error> {
        let item = self
            .store
            .get(Table::Journal, &StreakRecord::key(user_id))
            .await
            .map_err(map_store_error)?;
        item.map_or(Ok(0), |item| {
            decode::<StreakRecord>(item).map(|record| record.current_streak)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{KeyValueStoreError, MockKeyValueStore};
    use crate::domain::records::to_item;
    use crate::domain::{ErrorCode, Streak};
    use chrono::NaiveDate;
    use rstest::rstest;

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn user() -> UserId {
        UserId::new(USER).expect("valid user id")
    }

    #[rstest]
    #[tokio::test]
    async fn influence_reads_the_stored_score() {
        let mut store = MockKeyValueStore::new();
        let item = to_item(&InfluenceScoreRecord::new(&user(), 12)).expect("encode score");
        store
            .expect_get()
            .withf(|table, key| *table == Table::Journal && key.pk == USER && key.sk == "INFLUENCE_SCORE")
            .return_once(move |_, _| Ok(Some(item)));

        let score = ScoreService::new(Arc::new(store))
            .influence(&user())
            .await
            .expect("read succeeds");
        assert_eq!(score, 12);
    }

    #[rstest]
    #[tokio::test]
    async fn streak_reads_the_current_length() {
        let mut store = MockKeyValueStore::new();
        let start = NaiveDate::from_ymd_opt(2024, 4, 29).expect("valid date");
        let streak = Streak {
            start,
            end: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
            current: 3,
            max: 5,
        };
        let item = to_item(&StreakRecord::from_streak(&user(), &streak)).expect("encode streak");
        store
            .expect_get()
            .withf(|_, key| key.sk == "STREAK")
            .return_once(move |_, _| Ok(Some(item)));

        let current = ScoreService::new(Arc::new(store))
            .streak(&user())
            .await
            .expect("read succeeds");
        assert_eq!(current, 3);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_records_read_as_zero() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().times(2).returning(|_, _| Ok(None));
        let service = ScoreService::new(Arc::new(store));

        assert_eq!(service.influence(&user()).await.expect("read succeeds"), 0);
        assert_eq!(service.streak(&user()).await.expect("read succeeds"), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_are_internal() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .return_once(|_, _| Err(KeyValueStoreError::connection("down")));

        let err = ScoreService::new(Arc::new(store))
            .influence(&user())
            .await
            .expect_err("read fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
