use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;

use crate::{EventRecord, LibrettoConfig};

#[derive(Debug, Error)]
pub enum LibrettoClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http error: {status}")]
    Http { status: StatusCode, body: String },
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("event sink failed: {0}")]
    Sink(String),
}

#[derive(Clone)]
pub struct LibrettoClient {
    client: Client,
    api_url: String,
}

impl LibrettoClient {
    pub fn new(config: &LibrettoConfig) -> Result<Self, LibrettoClientError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    pub fn event_url(&self) -> String {
        format!("{}/event", self.api_url.trim_end_matches('/'))
    }

    /// Posts a single event. No retries: callers treat upload as best effort.
    pub async fn send_event(&self, event: &EventRecord) -> Result<(), LibrettoClientError> {
        let payload = event_payload(event)?;
        let response = self
            .client
            .post(self.event_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(LibrettoClientError::Http { status, body })
    }
}

/// Wire body for an event; the API key travels in the body, not a header.
pub(crate) fn event_payload(event: &EventRecord) -> Result<Value, LibrettoClientError> {
    let mut payload = serde_json::to_value(event)?;
    if let (Some(key), Value::Object(map)) = (&event.api_key, &mut payload) {
        map.insert(
            "apiKey".to_string(),
            Value::String(key.expose_secret().to_string()),
        );
    }
    Ok(payload)
}
