//! Reaction ledger over the journal table.
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{KeyValueStore, Reaction, ReactionLedger};
use crate::domain::records::{PK, ReactionRecord, Table};
use crate::domain::service_support::{batch_get_all, encode, map_store_error};
use crate::domain::{Error, UserId};

/// Likes stored as one record per `(entry line, liker)`.
#[derive(Clone)]
pub struct ReactionService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> ReactionService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ?Sized> ReactionLedger for ReactionService<S>
where
    S: KeyValueStore,
{
    async fn react(&self, reaction: Reaction) -> Result<(), Error> {
        let record = ReactionRecord::new(
            &reaction.creator_id,
            &reaction.entry_id,
            reaction.index,
            &reaction.liked_by,
        );
        self.store
            .put(Table::Journal, encode(&record)?)
            .await
            .map_err(map_store_error)?;
        info!(
            entry_id = %reaction.entry_id,
            index = %reaction.index,
            liked_by = %reaction.liked_by,
            "reaction recorded"
        );
        Ok(())
    }

    async fn liked(&self, user_id: &UserId, ids: Vec<String>) -> Result<Vec<String>, Error> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

        if ids.is_empty() {
            return Ok(ids);
        }
        let keys = ids
            .iter()
            .map(|id| ReactionRecord::lookup_key(id, user_id))
            .collect();
        let output = batch_get_all(&*self.store, Table::Journal, keys)
            .await
            .map_err(|err| {
                warn!(user_id = %user_id, error = %err, "reaction lookup failed");
                Error::not_found("reactions could not be read")
            })?;
        if !output.unprocessed.is_empty() {
            warn!(
                user_id = %user_id,
                unprocessed = output.unprocessed.len(),
                "reaction lookup left keys unread"
            );
        }
        let found: HashSet<&str> = output
            .items
            .iter()
            .filter_map(|item| ReactionRecord::liked_id(item.get(PK)?.as_str()?))
            .collect();

        Ok(ids.into_iter().filter(|id| found.contains(id.as_str())).collect())
    }
}
