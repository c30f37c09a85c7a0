//! Test doubles shared by unit and integration tests.
//!
//! Enabled with the `test-utils` feature.

use crate::config::CommsConfig;
use crate::core::{Event, Medium};
use crate::error::MediumError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A scriptable medium that records every call made to it.
#[derive(Debug)]
pub struct MockMedium {
    name: String,
    enabled: bool,
    connected: AtomicBool,
    connect_error: Option<MediumError>,
    fail_on_send: AtomicBool,
    send_delay: Option<Duration>,
    connect_calls: AtomicUsize,
    send_attempts: AtomicUsize,
    delivered: Mutex<Vec<Event>>,
}

impl MockMedium {
    /// An enabled, not yet connected medium whose calls all succeed.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            connected: AtomicBool::new(false),
            connect_error: None,
            fail_on_send: AtomicBool::new(false),
            send_delay: None,
            connect_calls: AtomicUsize::new(0),
            send_attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn already_connected(self) -> Self {
        self.connected.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_connect(mut self, error: MediumError) -> Self {
        self.connect_error = Some(error);
        self
    }

    pub fn failing_send(self) -> Self {
        self.set_fail_on_send(true);
        self
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn set_fail_on_send(&self, fail: bool) {
        self.fail_on_send.store(fail, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst)
    }

    /// Events that were successfully delivered, in arrival order.
    pub fn delivered(&self) -> Vec<Event> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Medium for MockMedium {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, _config: &CommsConfig) {}

    async fn connect(&self) -> Result<(), MediumError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.connect_error {
            return Err(err.clone());
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_event(&self, event: &Event) -> Result<(), MediumError> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on_send.load(Ordering::SeqCst) {
            return Err(MediumError::Network("mock send failure".to_string()));
        }
        self.delivered.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
