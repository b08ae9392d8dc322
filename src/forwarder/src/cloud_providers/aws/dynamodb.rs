use super::errors::classify_sdk_error;
use crate::adapters::{AdapterError, AdapterResult, MarkerStore};
use crate::types::Watermark;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb as dynamodb;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType, TableStatus,
};
use std::collections::HashMap;
use std::time::Duration;

const KEY_ATTRIBUTE: &str = "stream_key";
const WATERMARK_ATTRIBUTE: &str = "first_flushed_event";

const TABLE_READY_POLL_INTERVAL: Duration = Duration::from_secs(2);
const TABLE_READY_MAX_POLLS: u32 = 60;

/// Watermarks kept as one DynamoDB item per stream.
pub struct DynamoMarkerStore {
    client: dynamodb::Client,
    table: String,
}

impl DynamoMarkerStore {
    pub fn new(config: &SdkConfig, table: &str) -> Self {
        Self {
            client: dynamodb::Client::new(config),
            table: table.to_string(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the table if it does not exist yet and waits until it accepts writes.
    pub async fn ensure_table(&self) -> AdapterResult<()> {
        if self.table_status().await?.is_none() {
            tracing::info!(table = %self.table, "Marker table does not exist, creating...");
            self.create_table().await?;
        }

        for _ in 0..TABLE_READY_MAX_POLLS {
            match self.table_status().await? {
                Some(TableStatus::Active) => return Ok(()),
                status => {
                    tracing::debug!(table = %self.table, ?status, "Waiting for marker table");
                    tokio::time::sleep(TABLE_READY_POLL_INTERVAL).await;
                }
            }
        }

        Err(AdapterError::transient(format!(
            "marker table {} did not become active",
            self.table
        )))
    }

    /// `None` when the table does not exist.
    async fn table_status(&self) -> AdapterResult<Option<TableStatus>> {
        match self
            .client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await
        {
            Ok(output) => Ok(output
                .table()
                .and_then(|table| table.table_status())
                .cloned()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(classify_sdk_error("DescribeTable", err)),
        }
    }

    async fn create_table(&self) -> AdapterResult<()> {
        let key_definition = AttributeDefinition::builder()
            .attribute_name(KEY_ATTRIBUTE)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|err| AdapterError::rejected(err.to_string()))?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(KEY_ATTRIBUTE)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|err| AdapterError::rejected(err.to_string()))?;

        match self
            .client
            .create_table()
            .table_name(&self.table)
            .attribute_definitions(key_definition)
            .key_schema(key_schema)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            // someone else is creating it right now
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_in_use_exception()) =>
            {
                Ok(())
            }
            Err(err) => Err(classify_sdk_error("CreateTable", err)),
        }
    }
}

fn watermark_from_item(
    key: &str,
    item: &HashMap<String, AttributeValue>,
) -> AdapterResult<Option<Watermark>> {
    match item.get(WATERMARK_ATTRIBUTE) {
        None => Ok(None),
        Some(AttributeValue::S(id)) => Ok(Some(Watermark::new(id.clone()))),
        Some(other) => Err(AdapterError::rejected(format!(
            "marker {} has a non-string {}: {:?}",
            key, WATERMARK_ATTRIBUTE, other
        ))),
    }
}

#[async_trait]
impl MarkerStore for DynamoMarkerStore {
    async fn get(&self, key: &str) -> AdapterResult<Option<Watermark>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| classify_sdk_error("GetItem", err))?;

        match output.item() {
            Some(item) => watermark_from_item(key, item),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, watermark: &Watermark) -> AdapterResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .item(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .item(
                WATERMARK_ATTRIBUTE,
                AttributeValue::S(watermark.as_str().to_string()),
            )
            .send()
            .await
            .map_err(|err| classify_sdk_error("PutItem", err))?;
        Ok(())
    }
}
