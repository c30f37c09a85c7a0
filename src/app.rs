//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::{Event, Medium},
    dispatcher::Dispatcher,
    file, notification,
};
use anyhow::Result;
use async_channel::Receiver;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// A handle to the initialized application.
pub struct App {
    config: Config,
    dispatcher: Arc<Dispatcher>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Broadcasts every event received on `events_rx` until the channel closes
    /// or the shutdown signal fires, then writes the status snapshot.
    #[instrument(skip_all)]
    pub async fn run(
        self,
        events_rx: Receiver<Event>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut relayed: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Relay received shutdown signal.");
                    break;
                }
                result = events_rx.recv() => {
                    match result {
                        Ok(event) => {
                            debug!(event = %event, "Broadcasting event");
                            self.dispatcher.broadcast(&event).await;
                            relayed += 1;
                        }
                        Err(_) => {
                            info!("Event channel closed.");
                            break;
                        }
                    }
                }
            }
        }

        info!(relayed, "Relay finished.");
        self.write_status_snapshot()
    }

    fn write_status_snapshot(&self) -> Result<()> {
        let Some(path) = &self.config.status_snapshot_path else {
            return Ok(());
        };
        let snapshot = serde_json::json!({
            "started_at": self.dispatcher.started_at(),
            "uptime_seconds": self.dispatcher.uptime().map(|d| d.num_seconds()),
            "mediums": self.dispatcher.status(),
        });
        file::write_atomic(path, &serde_json::to_vec_pretty(&snapshot)?)?;
        info!(path = %path.display(), "Wrote status snapshot");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates constructing the mediums from running the relay, and lets tests
/// substitute their own mediums.
pub struct AppBuilder {
    config: Config,
    mediums_override: Option<Vec<Arc<dyn Medium>>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            mediums_override: None,
        }
    }

    /// Overrides the configured mediums for testing.
    pub fn mediums_override(mut self, mediums: Vec<Arc<dyn Medium>>) -> Self {
        self.mediums_override = Some(mediums);
        self
    }

    /// Builds the dispatcher and connects every enabled medium.
    #[instrument(skip_all)]
    pub async fn build(self) -> Result<App> {
        let config = self.config;
        let mediums = match self.mediums_override {
            Some(mediums) => mediums,
            None => notification::from_config(&config.comms),
        };

        let dispatcher = Arc::new(Dispatcher::new(mediums));
        dispatcher.initialize().await;

        if let Err(e) = dispatcher.has_active_medium() {
            warn!("{}. Events will not be delivered anywhere.", e);
        }

        info!("Relay initialized with {} mediums.", dispatcher.len());
        Ok(App { config, dispatcher })
    }
}
