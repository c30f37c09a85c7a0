//! Configuration management for commsrelay
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an optional TOML file,
//! `COMMSRELAY_`-prefixed environment variables and command-line arguments.

use crate::cli::Cli;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The logging level (an `EnvFilter` directive) for the application.
    pub log_level: String,
    /// Where to write a JSON snapshot of medium status on shutdown.
    pub status_snapshot_path: Option<PathBuf>,
    /// Capacity of the queue between the event source and the dispatcher.
    pub event_queue_capacity: usize,
    /// Per-medium settings.
    pub comms: CommsConfig,
}

/// Settings for every supported medium. Each medium reads only its own section.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CommsConfig {
    pub log: LogMediumConfig,
    pub slack: SlackConfig,
    pub telegram: TelegramConfig,
    pub sms_global: SmsGlobalConfig,
}

/// Configuration for the log medium.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogMediumConfig {
    pub enabled: bool,
}

impl Default for LogMediumConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Configuration for Slack incoming-webhook delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SlackConfig {
    pub enabled: bool,
    /// The Slack incoming webhook URL.
    pub webhook_url: String,
    /// Per-request timeout.
    pub timeout_seconds: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            timeout_seconds: 10,
        }
    }
}

/// Configuration for the Telegram bot medium.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    /// Chat (user, group or channel) that receives every event.
    pub chat_id: String,
    /// Base URL of the Bot API. Overridable for testing.
    pub api_url: String,
    pub timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Configuration for the SMSGlobal HTTP gateway.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SmsGlobalConfig {
    pub enabled: bool,
    pub username: String,
    pub password: String,
    /// Sender id shown on the handset.
    pub from: String,
    pub contacts: Vec<SmsContact>,
    pub api_url: String,
    pub timeout_seconds: u64,
}

impl Default for SmsGlobalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: String::new(),
            password: String::new(),
            from: "commsrelay".to_string(),
            contacts: Vec::new(),
            api_url: "https://api.smsglobal.com/http-api.php".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// A single SMS recipient.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SmsContact {
    pub name: String,
    pub number: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are layered lowest to highest precedence: defaults, the TOML
    /// file named by `--config` (if any), environment variables such as
    /// `COMMSRELAY_COMMS__SLACK__ENABLED=true`, then command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed("COMMSRELAY_").split("__"))
            .merge(cli.clone())
            .extract()?;

        if config.event_queue_capacity == 0 {
            bail!("event_queue_capacity must be greater than zero");
        }
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            status_snapshot_path: None,
            event_queue_capacity: 1024,
            comms: CommsConfig::default(),
        }
    }
}
