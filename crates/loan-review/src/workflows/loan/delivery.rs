use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use super::report::DeliveryMetadata;

/// Outbound sink for finished reports (webhook, e-mail relay, chat).
pub trait DeliveryChannel: Send + Sync {
    fn send(&self, message: &str, metadata: &DeliveryMetadata) -> Result<(), DeliveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery transport unavailable: {0}")]
    Transport(String),
    #[error("delivery endpoint rejected report with status {status}")]
    Rejected { status: u16 },
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    message: &'a str,
    subject: &'a str,
    to: &'a str,
}

/// Posts reports as JSON to a configured webhook URL.
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl DeliveryChannel for WebhookChannel {
    fn send(&self, message: &str, metadata: &DeliveryMetadata) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            message,
            subject: &metadata.subject,
            to: &metadata.to,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                status: resp.status().as_u16(),
            })
        }
    }
}
