use async_trait::async_trait;
use hoster_data::{DataError, Store};
use hoster_schema::Row;
use serde_json::Value;
use std::sync::Arc;

/// Append-only usage-event recorder. There is no generic update path for
/// `usage_event` rows — this is the only writer.
#[async_trait]
pub trait BillingRecorder: Send + Sync {
    async fn record_event(
        &self,
        owner_id: i64,
        event_type: &str,
        resource_ref: &str,
        resource_type: &str,
        metadata: Value,
    ) -> Result<Row, DataError>;
}

/// Writes directly into the `usage_event` table via the store, the same
/// path every other resource's `create` goes through.
pub struct StoreBillingRecorder {
    store: Arc<dyn Store>,
}

impl StoreBillingRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BillingRecorder for StoreBillingRecorder {
    async fn record_event(
        &self,
        owner_id: i64,
        event_type: &str,
        resource_ref: &str,
        resource_type: &str,
        metadata: Value,
    ) -> Result<Row, DataError> {
        let mut payload = Row::new();
        payload.insert("owner_id".to_string(), Value::from(owner_id));
        payload.insert("event_type".to_string(), Value::String(event_type.to_string()));
        payload.insert("resource_ref".to_string(), Value::String(resource_ref.to_string()));
        payload.insert("resource_type".to_string(), Value::String(resource_type.to_string()));
        payload.insert("metadata".to_string(), metadata);
        payload.insert(
            "reported_at".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        self.store.create("usage_event", payload).await
    }
}
