//! Journal service: daily submissions, today's view, sharing and the social
//! feed.
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures_util::future::join_all;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    EntryQueue, IndexQuery, JournalCommand, JournalQuery, KeyValueStore, SecondaryIndex,
    ShareOutcome,
};
use crate::domain::records::{EntryRecord, Item, ItemKey, Table, day_key, from_item};
use crate::domain::service_support::{encode, map_store_error};
use crate::domain::{
    EntryId, EntryIndex, Error, JournalEntry, SharedEntryView, SocialPage, Submission,
    TodayEntries, UserId,
};

/// Default number of entries per social feed page.
pub const DEFAULT_SOCIAL_PAGE_SIZE: usize = 25;

/// Journal use cases over the journal table.
#[derive(Clone)]
pub struct JournalService<S: ?Sized> {
    store: Arc<S>,
    queue: Arc<dyn EntryQueue>,
    clock: Arc<dyn Clock>,
    social_page_size: usize,
}

impl<S: ?Sized> JournalService<S> {
    pub fn new(store: Arc<S>, queue: Arc<dyn EntryQueue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            queue,
            clock,
            social_page_size: DEFAULT_SOCIAL_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_social_page_size(mut self, size: usize) -> Self {
        self.social_page_size = size.max(1);
        self
    }
}

impl<S: ?Sized> JournalService<S>
where
    S: KeyValueStore,
{
    async fn query_all(&self, query: IndexQuery) -> Result<Vec<Item>, Error> {
        let mut items = Vec::new();
        let mut start_after = None;
        loop {
            let page = self
                .store
                .query(Table::Journal, query.clone().starting_after(start_after))
                .await
                .map_err(map_store_error)?;
            items.extend(page.items);
            match page.last_key {
                Some(key) => start_after = Some(key),
                None => return Ok(items),
            }
        }
    }

    async fn todays_entries(&self, user_id: &UserId) -> Result<Vec<JournalEntry>, Error> {
        let today = self.clock.utc().date_naive();
        let query = IndexQuery::new(SecondaryIndex::Gsi1, EntryRecord::day_index(user_id, today));
        let mut entries = Vec::new();
        for item in self.query_all(query).await? {
            match decode_entry(item) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(user_id = %user_id, error = %err, "skipping unreadable entry"),
            }
        }
        entries.sort_by_key(|entry| entry.index);
        Ok(entries)
    }
}

fn decode_entry(item: Item) -> Result<JournalEntry, crate::domain::records::RecordError> {
    from_item::<EntryRecord>(item)?.into_entry()
}

fn encode_cursor(key: &ItemKey) -> Result<String, Error> {
    let bytes = serde_json::to_vec(key)
        .map_err(|err| Error::internal(format!("failed to encode feed cursor: {err}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_cursor(token: &str) -> Result<ItemKey, Error> {
    URL_SAFE_NO_PAD
        .decode(token.trim())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| Error::invalid_request("nextToken is not a valid cursor"))
}

#[async_trait]
impl<S: ?Sized> JournalCommand for JournalService<S>
where
    S: KeyValueStore,
{
    async fn submit(&self, user_id: &UserId, submission: Submission) -> Result<EntryId, Error> {
        let id = submission.id.unwrap_or_else(EntryId::random);
        let today = self.clock.utc().date_naive();
        let items = EntryIndex::ALL
            .into_iter()
            .zip(submission.texts)
            .map(|(index, text)| {
                encode(&EntryRecord::from_entry(&JournalEntry {
                    user_id: user_id.clone(),
                    id: id.clone(),
                    index,
                    text,
                    written_on: today,
                    shared_on: None,
                }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .store
            .batch_write(Table::Journal, items)
            .await
            .map_err(map_store_error)?;
        if !output.unprocessed.is_empty() {
            warn!(
                user_id = %user_id,
                entry_id = %id,
                unprocessed = output.unprocessed.len(),
                "submission only partly saved"
            );
            return Err(Error::internal("failed to save every entry"));
        }
        info!(user_id = %user_id, entry_id = %id, day = %day_key(today), "entries submitted");
        Ok(id)
    }

    async fn share_today(&self, user_id: &UserId) -> Result<ShareOutcome, Error> {
        let entries = self.todays_entries(user_id).await?;
        let results = join_all(entries.iter().map(|entry| self.queue.enqueue(entry))).await;
        let mut outcome = ShareOutcome::default();
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(()) => outcome.queued += 1,
                Err(err) => {
                    outcome.failed += 1;
                    warn!(
                        user_id = %user_id,
                        entry_id = %entry.id,
                        index = %entry.index,
                        error = %err,
                        "failed to queue entry for review"
                    );
                }
            }
        }
        info!(
            user_id = %user_id,
            queued = outcome.queued,
            failed = outcome.failed,
            "entries shared"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<S: ?Sized> JournalQuery for JournalService<S>
where
    S: KeyValueStore,
{
    async fn today(&self, user_id: &UserId) -> Result<TodayEntries, Error> {
        let entries = self.todays_entries(user_id).await?;
        Ok(TodayEntries::from_entries(&entries))
    }

    async fn social_feed(&self, next_token: Option<String>) -> Result<SocialPage, Error> {
        let start_after = next_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .map(decode_cursor)
            .transpose()?;
        let today = self.clock.utc().date_naive();
        let query = IndexQuery::new(SecondaryIndex::Gsi2, EntryRecord::social_index(today))
            .with_limit(self.social_page_size)
            .starting_after(start_after);
        let page = self
            .store
            .query(Table::Journal, query)
            .await
            .map_err(map_store_error)?;

        let entries = page
            .items
            .into_iter()
            .filter_map(|item| match decode_entry(item) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable shared entry");
                    None
                }
            })
            .filter(|entry| !entry.text.trim().is_empty())
            .map(|entry| SharedEntryView::from(&entry))
            .collect();
        let next_token = page.last_key.as_ref().map(encode_cursor).transpose()?;
        Ok(SocialPage {
            entries,
            next_token,
        })
    }
}

#[cfg(test)]
#[path = "journal_service_tests.rs"]
mod tests;
