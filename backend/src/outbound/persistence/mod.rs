//! Key-value store adapters.
//!
//! Both adapters speak the same item shape: a JSON object addressed by
//! `_pk`/`_sk`, with optional `gsi1`/`gsi2` index attributes and an `_ttl`
//! expiry in epoch seconds. Expired items read as absent.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gratitude_backend::outbound::persistence::InMemoryStore;
//! use mockable::DefaultClock;
//!
//! let store = InMemoryStore::new(Arc::new(DefaultClock));
//! let _changes = store.subscribe();
//! ```

#[cfg(feature = "dynamo")]
mod dynamo_store;
#[cfg(feature = "dynamo")]
mod dynamo_stream;
mod memory_store;

#[cfg(feature = "dynamo")]
pub use dynamo_store::{DynamoStore, DynamoTables};
#[cfg(feature = "dynamo")]
pub use dynamo_stream::{DEFAULT_POLL_INTERVAL, DynamoStreamPoller, change_event};
pub use memory_store::{BatchLimits, CHANGE_CHANNEL_CAPACITY, InMemoryStore};
