//! A medium that sends events as SMS through the SMSGlobal HTTP API.

use crate::config::{CommsConfig, SmsContact};
use crate::core::{Event, Medium};
use crate::error::MediumError;
use crate::formatting::{EventFormatter, PlainTextFormatter};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub struct SmsGlobalMedium {
    enabled: bool,
    username: String,
    password: String,
    from: String,
    contacts: Vec<SmsContact>,
    api_url: String,
    timeout: Duration,
    formatter: Box<dyn EventFormatter>,
    client: OnceLock<reqwest::Client>,
    connected: AtomicBool,
}

impl SmsGlobalMedium {
    pub fn new() -> Self {
        Self {
            enabled: false,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            contacts: Vec::new(),
            api_url: String::new(),
            timeout: Duration::from_secs(10),
            formatter: Box::new(PlainTextFormatter),
            client: OnceLock::new(),
            connected: AtomicBool::new(false),
        }
    }

    fn enabled_contacts(&self) -> impl Iterator<Item = &SmsContact> {
        self.contacts.iter().filter(|contact| contact.enabled)
    }

    async fn send_to_contact(
        &self,
        client: &reqwest::Client,
        contact: &SmsContact,
        text: &str,
    ) -> Result<(), MediumError> {
        let response = client
            .get(&self.api_url)
            .query(&[
                ("action", "sendsms"),
                ("user", self.username.as_str()),
                ("password", self.password.as_str()),
                ("from", self.from.as_str()),
                ("to", contact.number.as_str()),
                ("text", text),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        // The gateway answers "OK: 0; Sent queued message ID: ..." on success
        // and "ERROR: <code>" otherwise, usually with a 200 status.
        if !status.is_success() || !body.trim_start().starts_with("OK") {
            return Err(MediumError::Protocol(format!(
                "smsglobal rejected message to {}: {}",
                contact.name,
                body.trim()
            )));
        }
        Ok(())
    }
}

impl Default for SmsGlobalMedium {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Medium for SmsGlobalMedium {
    fn name(&self) -> &str {
        "smsglobal"
    }

    fn configure(&mut self, config: &CommsConfig) {
        let sms = &config.sms_global;
        self.enabled = sms.enabled;
        self.username = sms.username.clone();
        self.password = sms.password.clone();
        self.from = sms.from.clone();
        self.contacts = sms.contacts.clone();
        self.api_url = sms.api_url.clone();
        self.timeout = Duration::from_secs(sms.timeout_seconds);
    }

    /// The HTTP API is stateless; connecting checks credentials and recipients
    /// are present and prepares the client.
    async fn connect(&self) -> Result<(), MediumError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(MediumError::NotConfigured(
                "smsglobal username and password are required".to_string(),
            ));
        }
        if self.enabled_contacts().next().is_none() {
            return Err(MediumError::NotConfigured(
                "smsglobal has no enabled contacts".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let _ = self.client.set(client);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Sends to every enabled contact. All contacts are attempted; the first
    /// failure is returned.
    #[instrument(skip_all, fields(medium = "smsglobal", event_type = %event.event_type))]
    async fn send_event(&self, event: &Event) -> Result<(), MediumError> {
        let client = self.client.get().ok_or(MediumError::NotConnected)?;
        let text = self.formatter.format(event);

        let mut first_error = None;
        for contact in self.enabled_contacts() {
            match self.send_to_contact(client, contact, &text).await {
                Ok(()) => debug!(contact = %contact.name, "SMS queued"),
                Err(e) => {
                    warn!(contact = %contact.name, error = %e, "SMS delivery failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
