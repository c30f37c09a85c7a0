//! A medium that posts events to a Slack incoming webhook.

use crate::config::CommsConfig;
use crate::core::{Event, Medium};
use crate::error::MediumError;
use crate::formatting::{EventFormatter, SlackTextFormatter};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Delivers events to the configured Slack webhook.
pub struct SlackMedium {
    enabled: bool,
    webhook_url: String,
    formatter: Box<dyn EventFormatter>,
    timeout: Duration,
    client: OnceLock<reqwest::Client>,
    connected: AtomicBool,
}

impl SlackMedium {
    /// Creates an unconfigured, disabled `SlackMedium`.
    pub fn new() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            formatter: Box::new(SlackTextFormatter),
            timeout: Duration::from_secs(10),
            client: OnceLock::new(),
            connected: AtomicBool::new(false),
        }
    }

    fn validate_webhook_url(&self) -> Result<Url, MediumError> {
        if self.webhook_url.is_empty() {
            return Err(MediumError::NotConfigured(
                "slack webhook_url is empty".to_string(),
            ));
        }
        let url = Url::parse(&self.webhook_url).map_err(|e| {
            MediumError::NotConfigured(format!("invalid slack webhook_url: {}", e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(MediumError::NotConfigured(format!(
                "unsupported webhook scheme '{}'",
                other
            ))),
        }
    }
}

impl Default for SlackMedium {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Medium for SlackMedium {
    fn name(&self) -> &str {
        "slack"
    }

    fn configure(&mut self, config: &CommsConfig) {
        self.enabled = config.slack.enabled;
        self.webhook_url = config.slack.webhook_url.clone();
        self.timeout = Duration::from_secs(config.slack.timeout_seconds);
    }

    /// Incoming webhooks have no probe endpoint, so connecting validates the
    /// URL and prepares the HTTP client without touching the network.
    async fn connect(&self) -> Result<(), MediumError> {
        let url = self.validate_webhook_url()?;
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let _ = self.client.set(client);
        self.connected.store(true, Ordering::SeqCst);
        info!(host = url.host_str().unwrap_or_default(), "Slack webhook ready");
        Ok(())
    }

    #[instrument(skip_all, fields(medium = "slack", event_type = %event.event_type))]
    async fn send_event(&self, event: &Event) -> Result<(), MediumError> {
        let client = self.client.get().ok_or(MediumError::NotConnected)?;
        let payload = json!({ "text": self.formatter.format(event) });

        let response = client.post(&self.webhook_url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediumError::Protocol(format!(
                "slack responded with status {}, body: {}",
                status, body
            )));
        }

        debug!("Successfully sent event to Slack.");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
