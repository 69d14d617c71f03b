//! Error mapping shared by the domain services.
//!
//! Collaborator failures all surface as internal errors (HTTP 500); the
//! original message stays in the log and in the unredacted error only.

use serde::de::DeserializeOwned;
use tracing::error;

use super::Error;
use super::ports::{
    BATCH_GET_LIMIT, BATCH_WRITE_LIMIT, BatchGetOutput, BatchWriteOutput, KeyValueStore,
    KeyValueStoreError, LoginMailerError, SecretCipherError, SessionTokenError,
};
use super::records::{Item, ItemKey, Table, from_item, to_item};

pub(crate) fn map_store_error(err: KeyValueStoreError) -> Error {
    error!(error = %err, "key-value store call failed");
    match err {
        KeyValueStoreError::ConditionFailed { key } => {
            Error::conflict(format!("item already exists: {key}"))
        }
        KeyValueStoreError::Connection { message } => {
            Error::internal(format!("store unavailable: {message}"))
        }
        KeyValueStoreError::Request { message } => {
            Error::internal(format!("store request failed: {message}"))
        }
        KeyValueStoreError::Codec { message } => {
            Error::internal(format!("store item codec failed: {message}"))
        }
    }
}

pub(crate) fn map_cipher_error(err: SecretCipherError) -> Error {
    error!(error = %err, "secret cipher call failed");
    Error::internal(err.to_string())
}

pub(crate) fn map_session_token_error(err: SessionTokenError) -> Error {
    error!(error = %err, "session token signing failed");
    Error::internal(err.to_string())
}

pub(crate) fn map_mailer_error(err: LoginMailerError) -> Error {
    error!(error = %err, "login email could not be sent");
    Error::internal(err.to_string())
}

pub(crate) fn decode<T: DeserializeOwned>(item: Item) -> Result<T, Error> {
    from_item(item).map_err(|err| {
        error!(error = %err, "stored item could not be decoded");
        Error::internal(err.to_string())
    })
}

pub(crate) fn encode<T: serde::Serialize>(record: &T) -> Result<Item, Error> {
    to_item(record).map_err(|err| Error::internal(err.to_string()))
}

/// Batched read split into store-sized requests; outputs are concatenated.
pub(crate) async fn batch_get_all<S: KeyValueStore + ?Sized>(
    store: &S,
    table: Table,
    keys: Vec<ItemKey>,
) -> Result<BatchGetOutput, KeyValueStoreError> {
    let mut output = BatchGetOutput::default();
    for chunk in keys.chunks(BATCH_GET_LIMIT) {
        let page = store.batch_get(table, chunk.to_vec()).await?;
        output.items.extend(page.items);
        output.unprocessed.extend(page.unprocessed);
    }
    Ok(output)
}

/// Batched write split into store-sized requests; outputs are concatenated.
pub(crate) async fn batch_write_all<S: KeyValueStore + ?Sized>(
    store: &S,
    table: Table,
    items: Vec<Item>,
) -> Result<BatchWriteOutput, KeyValueStoreError> {
    let mut output = BatchWriteOutput::default();
    for chunk in items.chunks(BATCH_WRITE_LIMIT) {
        let page = store.batch_write(table, chunk.to_vec()).await?;
        output.unprocessed.extend(page.unprocessed);
    }
    Ok(output)
}
