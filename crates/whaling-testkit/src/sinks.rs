use async_trait::async_trait;
use tokio::sync::RwLock;
use whaling_ports::{DispatchTransport, EventSink, SinkError, TransportError};
use whaling_schemas::{DomainEvent, RefreshBatch};

/// Transport that keeps every batch it was handed.
#[derive(Default)]
pub struct RecordingTransport {
    sent: RwLock<Vec<RefreshBatch>>,
    fail_on_send: RwLock<bool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_send(&self, fail: bool) {
        *self.fail_on_send.write().await = fail;
    }

    pub async fn sent(&self) -> Vec<RefreshBatch> {
        self.sent.read().await.clone()
    }

    /// Account ids across all sent batches, in send order.
    pub async fn sent_account_ids(&self) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .flat_map(|b| b.requests.iter().map(|r| r.account_id.clone()))
            .collect()
    }
}

#[async_trait]
impl DispatchTransport for RecordingTransport {
    async fn send(&self, batch: &RefreshBatch) -> Result<(), TransportError> {
        if *self.fail_on_send.read().await {
            return Err(TransportError::Send("injected send failure".to_string()));
        }
        self.sent.write().await.push(batch.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: RwLock<Vec<DomainEvent>>,
    fail_on_emit: RwLock<bool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_emit(&self, fail: bool) {
        *self.fail_on_emit.write().await = fail;
    }

    pub async fn events(&self) -> Vec<DomainEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: &DomainEvent) -> Result<(), SinkError> {
        if *self.fail_on_emit.read().await {
            return Err(SinkError::Unavailable("injected emit failure".to_string()));
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
