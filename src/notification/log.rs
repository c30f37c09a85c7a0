//! A medium that writes every event to the application log.
//!
//! Useful as an always-available sink and for validating the pipeline.

use crate::config::CommsConfig;
use crate::core::{Event, Medium};
use crate::error::MediumError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument};

pub struct LogMedium {
    enabled: bool,
    connected: AtomicBool,
}

impl LogMedium {
    pub fn new() -> Self {
        Self {
            enabled: false,
            connected: AtomicBool::new(false),
        }
    }
}

impl Default for LogMedium {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Medium for LogMedium {
    fn name(&self) -> &str {
        "log"
    }

    fn configure(&mut self, config: &CommsConfig) {
        self.enabled = config.log.enabled;
    }

    async fn connect(&self) -> Result<(), MediumError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[instrument(skip_all, fields(medium = "log"))]
    async fn send_event(&self, event: &Event) -> Result<(), MediumError> {
        if !self.is_connected() {
            return Err(MediumError::NotConnected);
        }
        info!(
            event_type = %event.event_type,
            timestamp = %event.timestamp.to_rfc3339(),
            "Event relayed: {}",
            event.message
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_log_medium_logs_event() {
        let mut medium = LogMedium::new();
        medium.configure(&CommsConfig::default());
        assert!(medium.is_enabled());

        medium.connect().await.unwrap();
        medium
            .send_event(&Event::new("unit-test", "hello from the log medium"))
            .await
            .unwrap();

        assert!(logs_contain("Event relayed: hello from the log medium"));
        assert!(logs_contain("event_type=unit-test"));
    }

    #[tokio::test]
    async fn test_log_medium_rejects_send_before_connect() {
        let medium = LogMedium::new();
        let result = medium.send_event(&Event::new("t", "m")).await;
        assert_eq!(result, Err(MediumError::NotConnected));
    }
}
