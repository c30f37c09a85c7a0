//! commsrelay - fan application events out to notification mediums
//!
//! This library provides the dispatcher that connects, broadcasts to and
//! reports on a set of independent notification backends, together with the
//! concrete backends and the configuration that selects them.
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod error;
pub mod file;
pub mod formatting;
pub mod notification;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export core types for convenience
pub use crate::core::{CommsStatus, Event, Medium};
pub use crate::dispatcher::Dispatcher;
pub use crate::error::{CommsError, FileError, MediumError};
