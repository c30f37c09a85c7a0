//! The dispatcher fans events out to every registered medium and aggregates
//! their connectivity status.
//!
//! Medium failures never escape the dispatcher: connection and delivery
//! errors are logged where they happen and the remaining mediums are still
//! attempted.

use crate::core::{CommsStatus, Event, Medium};
use crate::error::CommsError;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, instrument, warn};

/// Owns the registered mediums. Construct once and share behind an `Arc`.
pub struct Dispatcher {
    mediums: Vec<Arc<dyn Medium>>,
    started_at: OnceLock<DateTime<Utc>>,
}

impl Dispatcher {
    /// Creates a dispatcher over `mediums`, kept in registration order.
    ///
    /// Duplicate names are accepted but logged, since `status()` can only
    /// report the last medium registered under a given name.
    pub fn new(mediums: Vec<Arc<dyn Medium>>) -> Self {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for medium in &mediums {
            let name = medium.name();
            if !seen.insert(name) && reported.insert(name) {
                warn!(
                    medium = name,
                    "Multiple mediums registered with the same name; status will report the last one"
                );
            }
        }

        Self {
            mediums,
            started_at: OnceLock::new(),
        }
    }

    /// Connects every enabled medium that is not yet connected.
    ///
    /// A failed connection is logged and the medium skipped; this never fails.
    /// Calling it again only retries mediums that are still disconnected.
    #[instrument(skip_all, fields(mediums = self.mediums.len()))]
    pub async fn initialize(&self) {
        let started_at = *self.started_at.get_or_init(Utc::now);
        debug!(%started_at, "Initializing communication mediums");

        for medium in &self.mediums {
            if !medium.is_enabled() || medium.is_connected() {
                continue;
            }
            match medium.connect().await {
                Ok(()) => {
                    debug!(medium = medium.name(), "Medium is enabled and online");
                }
                Err(source) => {
                    let err = CommsError::Connection {
                        medium: medium.name().to_string(),
                        source,
                    };
                    error!(medium = medium.name(), error = %err, "Medium failed to connect");
                }
            }
        }
    }

    /// Delivers `event` to every enabled and connected medium.
    ///
    /// Deliveries run concurrently; failures are logged in registration order
    /// and are not returned. Inactive mediums are skipped silently.
    #[instrument(skip_all, fields(event_type = %event.event_type))]
    pub async fn broadcast(&self, event: &Event) {
        let active: Vec<&Arc<dyn Medium>> =
            self.mediums.iter().filter(|m| m.is_active()).collect();
        if active.is_empty() {
            debug!("No active mediums, event dropped");
            return;
        }

        let results = join_all(active.iter().map(|medium| medium.send_event(event))).await;

        for (medium, result) in active.iter().zip(results) {
            let name = medium.name().to_string();
            match result {
                Ok(()) => {
                    metrics::counter!("comms_events_sent_total", "medium" => name).increment(1);
                }
                Err(source) => {
                    metrics::counter!("comms_events_failed_total", "medium" => name.clone())
                        .increment(1);
                    let err = CommsError::Delivery {
                        medium: name,
                        source,
                    };
                    error!(
                        medium = medium.name(),
                        event = %event,
                        error = %err,
                        "Failed to deliver event"
                    );
                }
            }
        }
    }

    /// Current enabled/connected state of every registered medium, keyed by name.
    pub fn status(&self) -> HashMap<String, CommsStatus> {
        self.mediums
            .iter()
            .map(|medium| {
                (
                    medium.name().to_string(),
                    CommsStatus {
                        enabled: medium.is_enabled(),
                        connected: medium.is_connected(),
                    },
                )
            })
            .collect()
    }

    /// Succeeds if at least one medium is enabled and connected.
    pub fn has_active_medium(&self) -> Result<(), CommsError> {
        let mut count = 0;
        for medium in self.mediums.iter().filter(|m| m.is_active()) {
            debug!(medium = medium.name(), "Medium is enabled");
            count += 1;
        }
        if count == 0 {
            return Err(CommsError::NoActiveMedium);
        }
        debug!(active = count, "Communication mediums active");
        Ok(())
    }

    /// When `initialize` was first called.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at.get().copied()
    }

    pub fn uptime(&self) -> Option<chrono::Duration> {
        self.started_at().map(|started| Utc::now() - started)
    }

    pub fn len(&self) -> usize {
        self.mediums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mediums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediumError;
    use crate::testing::MockMedium;
    use std::time::{Duration, Instant};
    use tracing_test::traced_test;

    fn dispatcher_of(mediums: &[Arc<MockMedium>]) -> Dispatcher {
        Dispatcher::new(
            mediums
                .iter()
                .map(|m| m.clone() as Arc<dyn Medium>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_initialize_only_connects_enabled_disconnected_mediums() {
        let fresh = Arc::new(MockMedium::new("fresh"));
        let live = Arc::new(MockMedium::new("live").already_connected());
        let off = Arc::new(MockMedium::new("off").disabled());
        let dispatcher = dispatcher_of(&[fresh.clone(), live.clone(), off.clone()]);

        dispatcher.initialize().await;

        assert_eq!(fresh.connect_calls(), 1);
        assert_eq!(live.connect_calls(), 0);
        assert_eq!(off.connect_calls(), 0);
        assert!(fresh.is_connected());
        assert!(!off.is_connected());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_initialize_continues_after_connect_failure() {
        let broken = Arc::new(
            MockMedium::new("broken").failing_connect(MediumError::Auth("bad token".into())),
        );
        let healthy = Arc::new(MockMedium::new("healthy"));
        let dispatcher = dispatcher_of(&[broken.clone(), healthy.clone()]);

        dispatcher.initialize().await;

        assert_eq!(broken.connect_calls(), 1);
        assert_eq!(healthy.connect_calls(), 1);
        assert!(!broken.is_connected());
        assert!(healthy.is_connected());
        assert!(logs_contain("Medium failed to connect"));
        assert!(logs_contain("broken failed to connect: authentication failed: bad token"));
    }

    #[tokio::test]
    async fn test_initialize_records_start_time_once() {
        let dispatcher = dispatcher_of(&[Arc::new(MockMedium::new("a"))]);
        assert!(dispatcher.started_at().is_none());

        dispatcher.initialize().await;
        let first = dispatcher.started_at().unwrap();
        dispatcher.initialize().await;

        assert_eq!(dispatcher.started_at(), Some(first));
        assert!(dispatcher.uptime().unwrap() >= chrono::Duration::zero());
    }

    #[tokio::test]
    async fn test_reinitialize_does_not_reconnect_connected_mediums() {
        let medium = Arc::new(MockMedium::new("a"));
        let dispatcher = dispatcher_of(&[medium.clone()]);

        dispatcher.initialize().await;
        dispatcher.initialize().await;

        assert_eq!(medium.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_active_mediums() {
        let active = Arc::new(MockMedium::new("active").already_connected());
        let offline = Arc::new(MockMedium::new("offline"));
        let disabled = Arc::new(MockMedium::new("disabled").disabled().already_connected());
        let dispatcher = dispatcher_of(&[active.clone(), offline.clone(), disabled.clone()]);

        let event = Event::new("trade", "filled");
        dispatcher.broadcast(&event).await;

        assert_eq!(active.delivered(), vec![event]);
        assert_eq!(offline.send_attempts(), 0);
        assert_eq!(disabled.send_attempts(), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_broadcast_failure_does_not_stop_other_mediums() {
        let failing = Arc::new(MockMedium::new("failing").already_connected().failing_send());
        let healthy = Arc::new(MockMedium::new("healthy").already_connected());
        let dispatcher = dispatcher_of(&[failing.clone(), healthy.clone()]);

        dispatcher.broadcast(&Event::new("trade", "filled")).await;

        assert_eq!(failing.send_attempts(), 1);
        assert_eq!(healthy.delivered().len(), 1);
        assert!(failing.is_enabled());
        assert!(failing.is_connected());
        assert!(logs_contain("Failed to deliver event"));
        assert!(logs_contain("[trade] filled"));
    }

    #[tokio::test]
    async fn test_broadcast_runs_mediums_concurrently() {
        let slow_a = Arc::new(
            MockMedium::new("slow_a")
                .already_connected()
                .with_send_delay(Duration::from_millis(300)),
        );
        let slow_b = Arc::new(
            MockMedium::new("slow_b")
                .already_connected()
                .with_send_delay(Duration::from_millis(300)),
        );
        let dispatcher = dispatcher_of(&[slow_a.clone(), slow_b.clone()]);

        let start = Instant::now();
        dispatcher.broadcast(&Event::new("t", "m")).await;

        assert!(start.elapsed() < Duration::from_millis(550));
        assert_eq!(slow_a.delivered().len(), 1);
        assert_eq!(slow_b.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_status_reflects_observers_at_call_time() {
        let a = Arc::new(MockMedium::new("a"));
        let b = Arc::new(MockMedium::new("b").disabled());
        let dispatcher = dispatcher_of(&[a.clone(), b.clone()]);

        let before = dispatcher.status();
        assert_eq!(before.len(), 2);
        assert_eq!(before["a"], CommsStatus { enabled: true, connected: false });

        dispatcher.initialize().await;

        let after = dispatcher.status();
        assert_eq!(after["a"], CommsStatus { enabled: true, connected: true });
        assert_eq!(after["b"], CommsStatus { enabled: false, connected: false });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_duplicate_names_last_registration_wins() {
        let first = Arc::new(MockMedium::new("dup").already_connected());
        let second = Arc::new(MockMedium::new("dup").disabled());
        let dispatcher = dispatcher_of(&[first, second]);

        let status = dispatcher.status();
        assert_eq!(status.len(), 1);
        assert_eq!(status["dup"], CommsStatus { enabled: false, connected: false });
        assert!(logs_contain("Multiple mediums registered with the same name"));
    }

    #[test]
    fn test_has_active_medium() {
        let dispatcher = dispatcher_of(&[
            Arc::new(MockMedium::new("offline")),
            Arc::new(MockMedium::new("disabled").disabled().already_connected()),
        ]);
        assert!(matches!(
            dispatcher.has_active_medium(),
            Err(CommsError::NoActiveMedium)
        ));

        let dispatcher = dispatcher_of(&[
            Arc::new(MockMedium::new("offline")),
            Arc::new(MockMedium::new("live").already_connected()),
        ]);
        assert!(dispatcher.has_active_medium().is_ok());
    }

    #[test]
    fn test_empty_dispatcher() {
        let dispatcher = Dispatcher::new(Vec::new());
        assert!(dispatcher.is_empty());
        assert!(dispatcher.status().is_empty());
        assert!(dispatcher.has_active_medium().is_err());
    }

    fn counter_value(
        snapshot: &[(
            metrics_util::CompositeKey,
            Option<metrics::Unit>,
            Option<metrics::SharedString>,
            metrics_util::debugging::DebugValue,
        )],
        name: &str,
        medium: &str,
    ) -> Option<u64> {
        snapshot.iter().find_map(|(key, _, _, value)| {
            let key = key.key();
            let labelled = key
                .labels()
                .any(|label| label.key() == "medium" && label.value() == medium);
            match value {
                metrics_util::debugging::DebugValue::Counter(n) if key.name() == name && labelled => {
                    Some(*n)
                }
                _ => None,
            }
        })
    }

    #[test]
    fn test_broadcast_counts_sent_and_failed_per_medium() {
        use metrics_util::debugging::DebuggingRecorder;

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let ok = Arc::new(MockMedium::new("ok").already_connected());
        let bad = Arc::new(MockMedium::new("bad").already_connected().failing_send());
        let dispatcher = dispatcher_of(&[ok, bad]);

        // The local recorder is thread-bound, so drive the futures on this thread.
        metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                dispatcher.broadcast(&Event::new("t", "one")).await;
                dispatcher.broadcast(&Event::new("t", "two")).await;
            });
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(counter_value(&snapshot, "comms_events_sent_total", "ok"), Some(2));
        assert_eq!(counter_value(&snapshot, "comms_events_failed_total", "bad"), Some(2));
        assert_eq!(counter_value(&snapshot, "comms_events_sent_total", "bad"), None);
        assert_eq!(counter_value(&snapshot, "comms_events_failed_total", "ok"), None);
    }
}
