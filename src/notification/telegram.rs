//! A medium that relays events through a Telegram bot.

use crate::config::CommsConfig;
use crate::core::{Event, Medium};
use crate::error::MediumError;
use crate::formatting::{EventFormatter, PlainTextFormatter};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The envelope every Bot API response is wrapped in.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<BotUser>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    #[serde(default)]
    username: Option<String>,
}

pub struct TelegramMedium {
    enabled: bool,
    bot_token: String,
    chat_id: String,
    api_url: String,
    timeout: Duration,
    formatter: Box<dyn EventFormatter>,
    client: OnceLock<reqwest::Client>,
    connected: AtomicBool,
}

impl TelegramMedium {
    pub fn new() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: String::new(),
            timeout: Duration::from_secs(10),
            formatter: Box::new(PlainTextFormatter),
            client: OnceLock::new(),
            connected: AtomicBool::new(false),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_url.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }

    /// Maps a Bot API reply onto the medium error taxonomy.
    async fn read_response(response: reqwest::Response) -> Result<ApiResponse, MediumError> {
        let status = response.status();
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Err(MediumError::Auth(format!(
                "telegram rejected the bot token (status {})",
                status
            )));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| {
                MediumError::Protocol(format!(
                    "unreadable telegram response: {}",
                    e.without_url()
                ))
            })?;
        if !body.ok {
            return Err(MediumError::Protocol(
                body.description
                    .unwrap_or_else(|| format!("telegram returned ok=false (status {})", status)),
            ));
        }
        Ok(body)
    }
}

impl Default for TelegramMedium {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Medium for TelegramMedium {
    fn name(&self) -> &str {
        "telegram"
    }

    fn configure(&mut self, config: &CommsConfig) {
        self.enabled = config.telegram.enabled;
        self.bot_token = config.telegram.bot_token.clone();
        self.chat_id = config.telegram.chat_id.clone();
        self.api_url = config.telegram.api_url.clone();
        self.timeout = Duration::from_secs(config.telegram.timeout_seconds);
    }

    /// Verifies the bot token with `getMe`.
    async fn connect(&self) -> Result<(), MediumError> {
        if self.bot_token.is_empty() || self.chat_id.is_empty() {
            return Err(MediumError::NotConfigured(
                "telegram bot_token and chat_id are required".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let response = client.get(self.method_url("getMe")).send().await?;
        let body = Self::read_response(response).await?;

        let _ = self.client.set(client);
        self.connected.store(true, Ordering::SeqCst);
        info!(
            bot = body
                .result
                .and_then(|user| user.username)
                .unwrap_or_default(),
            "Telegram bot authenticated"
        );
        Ok(())
    }

    #[instrument(skip_all, fields(medium = "telegram", event_type = %event.event_type))]
    async fn send_event(&self, event: &Event) -> Result<(), MediumError> {
        let client = self.client.get().ok_or(MediumError::NotConnected)?;
        let payload = json!({
            "chat_id": self.chat_id,
            "text": self.formatter.format(event),
        });

        let response = client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;
        Self::read_response(response).await?;

        debug!("Successfully sent event to Telegram.");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
