//! Driven port for the key-value document store.
//!
//! The store addresses documents by `(_pk, _sk)` within a [`Table`], supports
//! a conditional "insert if absent" write, batched reads and writes that may
//! leave part of the request unprocessed, and paged queries over the `gsi1`
//! and `gsi2` secondary indexes.

use async_trait::async_trait;

use crate::domain::records::{Item, ItemKey, RecordError, Table};

use super::define_port_error;

/// Most keys a single batched read accepts.
pub const BATCH_GET_LIMIT: usize = 100;

/// Most items a single batched write accepts.
pub const BATCH_WRITE_LIMIT: usize = 25;

define_port_error! {
    /// Errors raised by key-value store adapters.
    pub enum KeyValueStoreError {
        /// A conditional write found an item already stored under the key.
        ConditionFailed { key: String } => "conditional write failed: {key} already exists",
        /// The store could not be reached.
        Connection { message: String } => "store connection failed: {message}",
        /// The store rejected or failed the request.
        Request { message: String } => "store request failed: {message}",
        /// An item could not be converted to or from its record shape.
        Codec { message: String } => "store item codec failed: {message}",
    }
}

impl From<RecordError> for KeyValueStoreError {
    fn from(err: RecordError) -> Self {
        Self::codec(err.to_string())
    }
}

/// Secondary indexes available for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryIndex {
    /// Users by id; entries by `<userId>/<date>`.
    Gsi1,
    /// Shared entries by `social/<date>`.
    Gsi2,
}

impl SecondaryIndex {
    /// Attribute holding the index key.
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Gsi1 => "gsi1",
            Self::Gsi2 => "gsi2",
        }
    }
}

/// Equality query against a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub index: SecondaryIndex,
    pub value: String,
    /// Maximum items per page; `None` reads everything.
    pub limit: Option<usize>,
    /// Resume after this key (exclusive), taken from a previous page.
    pub start_after: Option<ItemKey>,
}

impl IndexQuery {
    pub fn new(index: SecondaryIndex, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
            limit: None,
            start_after: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn starting_after(mut self, key: Option<ItemKey>) -> Self {
        self.start_after = key;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Key of the last item returned when more may follow.
    pub last_key: Option<ItemKey>,
}

/// Result of a batched read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchGetOutput {
    /// Items found; absent keys are simply missing.
    pub items: Vec<Item>,
    /// Keys the store did not get to.
    pub unprocessed: Vec<ItemKey>,
}

/// Result of a batched write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutput {
    /// Items the store did not write.
    pub unprocessed: Vec<Item>,
}

/// Document store holding every record of the application.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch one item; expired items read as absent.
    async fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Item>, KeyValueStoreError>;

    /// Insert or replace an item.
    async fn put(&self, table: Table, item: Item) -> Result<(), KeyValueStoreError>;

    /// Insert an item unless its partition key already exists.
    ///
    /// # Errors
    /// [`KeyValueStoreError::ConditionFailed`] when the key is taken.
    async fn put_if_absent(&self, table: Table, item: Item) -> Result<(), KeyValueStoreError>;

    /// Fetch many items; keys left unread are reported, not retried.
    async fn batch_get(
        &self,
        table: Table,
        keys: Vec<ItemKey>,
    ) -> Result<BatchGetOutput, KeyValueStoreError>;

    /// Insert or replace many items; items left unwritten are reported.
    async fn batch_write(
        &self,
        table: Table,
        items: Vec<Item>,
    ) -> Result<BatchWriteOutput, KeyValueStoreError>;

    /// Page through the items whose index attribute equals `query.value`.
    async fn query(&self, table: Table, query: IndexQuery) -> Result<QueryPage, KeyValueStoreError>;
}
