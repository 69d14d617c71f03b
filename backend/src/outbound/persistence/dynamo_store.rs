//! DynamoDB implementation of [`KeyValueStore`].
//!
//! Items convert through `serde_dynamo`, so the JSON item shape used by the
//! domain maps one-to-one onto attribute values. Expiry is enforced by the
//! table's TTL setting; because DynamoDB deletes lazily, expired items are
//! also filtered on read.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes, PutRequest, WriteRequest};
use mockable::Clock;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tracing::{debug, info};

use crate::domain::ports::{
    BatchGetOutput, BatchWriteOutput, IndexQuery, KeyValueStore, KeyValueStoreError, QueryPage,
};
use crate::domain::records::{Item, ItemKey, PK, TTL, Table};

type Attributes = HashMap<String, AttributeValue>;

/// Physical table names for each logical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoTables {
    pub auth: String,
    pub journal: String,
}

impl DynamoTables {
    fn name(&self, table: Table) -> &str {
        match table {
            Table::Auth => &self.auth,
            Table::Journal => &self.journal,
        }
    }
}

pub struct DynamoStore {
    client: Client,
    tables: DynamoTables,
    clock: Arc<dyn Clock>,
}

impl DynamoStore {
    pub fn new(client: Client, tables: DynamoTables, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            tables,
            clock,
        }
    }

    /// Build a client from a loaded AWS configuration.
    pub fn from_config(config: &SdkConfig, tables: DynamoTables, clock: Arc<dyn Clock>) -> Self {
        info!(auth = %tables.auth, journal = %tables.journal, "connected to DynamoDB");
        Self::new(Client::new(config), tables, clock)
    }

    /// ARN of the journal table's change stream.
    ///
    /// # Errors
    /// Fails when the table cannot be described or has no stream enabled.
    pub async fn journal_stream_arn(&self) -> Result<String, KeyValueStoreError> {
        let output = self
            .client
            .describe_table()
            .table_name(&self.tables.journal)
            .send()
            .await
            .map_err(request)?;
        output
            .table
            .and_then(|table| table.latest_stream_arn)
            .ok_or_else(|| {
                KeyValueStoreError::request(format!(
                    "table {} has no stream enabled",
                    self.tables.journal
                ))
            })
    }

    fn is_live(&self, item: &Item) -> bool {
        item.get(TTL)
            .and_then(serde_json::Value::as_i64)
            .is_none_or(|expires| expires > self.clock.utc().timestamp())
    }

    fn decode(&self, attributes: Attributes) -> Result<Option<Item>, KeyValueStoreError> {
        let item: Item = from_item(attributes).map_err(codec)?;
        Ok(self.is_live(&item).then_some(item))
    }

    fn decode_all(&self, rows: Vec<Attributes>) -> Result<Vec<Item>, KeyValueStoreError> {
        rows.into_iter()
            .filter_map(|row| self.decode(row).transpose())
            .collect()
    }

    async fn query_page(
        &self,
        table: Table,
        query: &IndexQuery,
        start: Option<Attributes>,
    ) -> Result<(Vec<Item>, Option<Attributes>), KeyValueStoreError> {
        let attribute = query.index.attribute();
        let limit = query
            .limit
            .map(|limit| i32::try_from(limit).unwrap_or(i32::MAX));
        let output = self
            .client
            .query()
            .table_name(self.tables.name(table))
            .index_name(attribute)
            .key_condition_expression("#k = :v")
            .expression_attribute_names("#k", attribute)
            .expression_attribute_values(":v", AttributeValue::S(query.value.clone()))
            .set_limit(limit)
            .set_exclusive_start_key(start)
            .send()
            .await
            .map_err(request)?;
        let items = self.decode_all(output.items.unwrap_or_default())?;
        Ok((items, output.last_evaluated_key))
    }
}

fn codec(err: serde_dynamo::Error) -> KeyValueStoreError {
    KeyValueStoreError::codec(err.to_string())
}

fn request(err: impl std::error::Error) -> KeyValueStoreError {
    KeyValueStoreError::request(err.to_string())
}

fn key_attributes(key: &ItemKey) -> Result<Attributes, KeyValueStoreError> {
    to_item(key).map_err(codec)
}

/// Exclusive start key for an index query: primary key plus index attribute.
fn start_key(query: &IndexQuery) -> Result<Option<Attributes>, KeyValueStoreError> {
    query
        .start_after
        .as_ref()
        .map(|key| {
            let mut attributes = key_attributes(key)?;
            attributes.insert(
                query.index.attribute().to_owned(),
                AttributeValue::S(query.value.clone()),
            );
            Ok(attributes)
        })
        .transpose()
}

fn item_key(attributes: &Attributes) -> Result<ItemKey, KeyValueStoreError> {
    from_item(attributes.clone()).map_err(codec)
}

#[async_trait]
impl KeyValueStore for DynamoStore {
    async fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Item>, KeyValueStoreError> {
        let output = self
            .client
            .get_item()
            .table_name(self.tables.name(table))
            .set_key(Some(key_attributes(key)?))
            .consistent_read(true)
            .send()
            .await
            .map_err(request)?;
        output.item.map_or(Ok(None), |item| self.decode(item))
    }

    async fn put(&self, table: Table, item: Item) -> Result<(), KeyValueStoreError> {
        self.client
            .put_item()
            .table_name(self.tables.name(table))
            .set_item(Some(to_item(item).map_err(codec)?))
            .send()
            .await
            .map_err(request)?;
        Ok(())
    }

    async fn put_if_absent(&self, table: Table, item: Item) -> Result<(), KeyValueStoreError> {
        let pk = item
            .get(PK)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let result = self
            .client
            .put_item()
            .table_name(self.tables.name(table))
            .set_item(Some(to_item(item).map_err(codec)?))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", PK)
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(ref inner))
                if matches!(inner.err(), PutItemError::ConditionalCheckFailedException(_)) =>
            {
                Err(KeyValueStoreError::condition_failed(pk))
            }
            Err(err) => Err(request(err)),
        }
    }

    async fn batch_get(
        &self,
        table: Table,
        keys: Vec<ItemKey>,
    ) -> Result<BatchGetOutput, KeyValueStoreError> {
        if keys.is_empty() {
            return Ok(BatchGetOutput::default());
        }
        let name = self.tables.name(table);
        let request_keys = keys
            .iter()
            .map(key_attributes)
            .collect::<Result<Vec<_>, _>>()?;
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(request_keys))
            .consistent_read(true)
            .build()
            .map_err(request)?;
        let output = self
            .client
            .batch_get_item()
            .request_items(name, keys_and_attributes)
            .send()
            .await
            .map_err(request)?;

        let rows = output
            .responses
            .and_then(|mut responses| responses.remove(name))
            .unwrap_or_default();
        let unprocessed = output
            .unprocessed_keys
            .and_then(|mut pending| pending.remove(name))
            .map(|pending| pending.keys)
            .unwrap_or_default()
            .iter()
            .map(item_key)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BatchGetOutput {
            items: self.decode_all(rows)?,
            unprocessed,
        })
    }

    async fn batch_write(
        &self,
        table: Table,
        items: Vec<Item>,
    ) -> Result<BatchWriteOutput, KeyValueStoreError> {
        if items.is_empty() {
            return Ok(BatchWriteOutput::default());
        }
        let name = self.tables.name(table);
        let requests = items
            .into_iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(to_item(item).map_err(codec)?))
                    .build()
                    .map_err(request)?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>, KeyValueStoreError>>()?;
        let output = self
            .client
            .batch_write_item()
            .request_items(name, requests)
            .send()
            .await
            .map_err(request)?;

        let unprocessed = output
            .unprocessed_items
            .and_then(|mut pending| pending.remove(name))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|pending| pending.put_request)
            .map(|put| from_item(put.item).map_err(codec))
            .collect::<Result<Vec<Item>, _>>()?;
        Ok(BatchWriteOutput { unprocessed })
    }

    async fn query(&self, table: Table, query: IndexQuery) -> Result<QueryPage, KeyValueStoreError> {
        let mut start = start_key(&query)?;
        let mut items = Vec::new();
        loop {
            let (page, last) = self.query_page(table, &query, start).await?;
            items.extend(page);
            // Bounded queries return one page; unbounded ones drain the index.
            if query.limit.is_some() || last.is_none() {
                let last_key = last.as_ref().map(item_key).transpose()?;
                debug!(count = items.len(), more = last_key.is_some(), "index query page");
                return Ok(QueryPage { items, last_key });
            }
            start = last;
        }
    }
}
