#![allow(dead_code)]
use commsrelay::core::Medium;
use commsrelay::error::MediumError;
use commsrelay::testing::MockMedium;
use std::sync::Arc;

/// The three mediums used by the startup scenarios:
/// `a` connects, `b` fails with a network error, `c` is disabled.
pub struct Scenario {
    pub a: Arc<MockMedium>,
    pub b: Arc<MockMedium>,
    pub c: Arc<MockMedium>,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            a: Arc::new(MockMedium::new("A")),
            b: Arc::new(
                MockMedium::new("B")
                    .failing_connect(MediumError::Network("connection refused".to_string())),
            ),
            c: Arc::new(MockMedium::new("C").disabled()),
        }
    }

    /// The mediums in registration order, as the dispatcher sees them.
    pub fn mediums(&self) -> Vec<Arc<dyn Medium>> {
        vec![
            self.a.clone() as Arc<dyn Medium>,
            self.b.clone() as Arc<dyn Medium>,
            self.c.clone() as Arc<dyn Medium>,
        ]
    }
}
