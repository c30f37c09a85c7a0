//! Error types for mediums, the dispatcher and the file helper.

use thiserror::Error;

/// Failure reported by a single medium's `connect` or `send_event`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediumError {
    #[error("medium is not configured: {0}")]
    NotConfigured(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("medium is not connected")]
    NotConnected,
}

impl From<reqwest::Error> for MediumError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry credentials (bot tokens, query-string passwords).
        let err = err.without_url();
        if err.is_timeout() {
            MediumError::Network(format!("request timed out: {}", err))
        } else {
            MediumError::Network(err.to_string())
        }
    }
}

/// Dispatcher-level conditions.
///
/// `Connection` and `Delivery` are absorbed and logged where they occur;
/// only `NoActiveMedium` is ever returned to a caller.
#[derive(Error, Debug)]
pub enum CommsError {
    #[error("{medium} failed to connect: {source}")]
    Connection {
        medium: String,
        #[source]
        source: MediumError,
    },

    #[error("{medium} failed to deliver event: {source}")]
    Delivery {
        medium: String,
        #[source]
        source: MediumError,
    },

    #[error("no communication mediums are enabled and connected")]
    NoActiveMedium,
}

/// Errors returned by the file persistence helpers.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
