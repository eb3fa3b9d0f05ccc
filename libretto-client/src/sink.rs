use async_trait::async_trait;

use crate::{EventRecord, LibrettoClient, LibrettoClientError};

/// Destination for finished event records.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: EventRecord) -> Result<(), LibrettoClientError>;
}

#[async_trait]
impl EventSink for LibrettoClient {
    async fn send(&self, event: EventRecord) -> Result<(), LibrettoClientError> {
        self.send_event(&event).await
    }
}
