//! Core domain types and the medium capability contract.
//!
//! Every notification backend implements [`Medium`]. The dispatcher only ever
//! sees `dyn Medium` and never inspects a concrete backend type.

use crate::config::CommsConfig;
use crate::error::MediumError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An application event to be relayed verbatim to every live medium.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Short category, e.g. "order_filled" or "startup".
    #[serde(rename = "type")]
    pub event_type: String,
    /// Human-readable body of the event.
    pub message: String,
    /// When the event was produced. Defaults to "now" when absent from input.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn new(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.event_type, self.message)
    }
}

/// Point-in-time view of one medium. Derived on every status call, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CommsStatus {
    pub enabled: bool,
    pub connected: bool,
}

// =============================================================================
// Medium Trait
// =============================================================================

/// The capability contract every notification backend must satisfy.
#[async_trait]
pub trait Medium: Send + Sync {
    /// Stable identifier, unique within one dispatcher (e.g. "slack").
    fn name(&self) -> &str;

    /// One-time setup. Each medium reads its own section of `config`.
    ///
    /// Misconfiguration is not reported here; it shows up later as
    /// `is_enabled() == false` or as a `connect` error.
    fn configure(&mut self, config: &CommsConfig);

    /// Establishes connectivity with the backend.
    ///
    /// # Returns
    /// * `Ok(())` once `is_connected()` will report `true`
    /// * `Err` describing the failure kind (auth, network, protocol)
    async fn connect(&self) -> Result<(), MediumError>;

    /// Delivers one event. Implementations bound their own latency.
    async fn send_event(&self, event: &Event) -> Result<(), MediumError>;

    fn is_enabled(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// Whether the dispatcher should deliver to this medium right now.
    fn is_active(&self) -> bool {
        self.is_enabled() && self.is_connected()
    }
}
