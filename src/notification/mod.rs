//! Concrete notification mediums.
//!
//! Each medium implements [`Medium`](crate::core::Medium) and owns its own
//! connection state and timeout policy. The dispatcher only depends on the
//! trait, so new backends can be added here without touching it.
pub mod log;
pub mod slack;
pub mod sms_global;
pub mod telegram;

pub use self::log::LogMedium;
pub use self::slack::SlackMedium;
pub use self::sms_global::SmsGlobalMedium;
pub use self::telegram::TelegramMedium;

use crate::config::CommsConfig;
use crate::core::Medium;
use std::sync::Arc;
use tracing::debug;

/// Builds and configures every supported medium.
///
/// Registration order is fixed: log, slack, telegram, smsglobal. Disabled
/// mediums are still registered so they appear in status reports.
pub fn from_config(config: &CommsConfig) -> Vec<Arc<dyn Medium>> {
    let mediums: Vec<Box<dyn Medium>> = vec![
        Box::new(LogMedium::new()),
        Box::new(SlackMedium::new()),
        Box::new(TelegramMedium::new()),
        Box::new(SmsGlobalMedium::new()),
    ];

    mediums
        .into_iter()
        .map(|mut medium| {
            medium.configure(config);
            debug!(
                medium = medium.name(),
                enabled = medium.is_enabled(),
                "Configured medium"
            );
            Arc::from(medium)
        })
        .collect()
}
