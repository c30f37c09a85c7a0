//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged on top
//! of the configuration file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Relays application events to every enabled notification medium.
///
/// Events are read from stdin, one per line, either as JSON
/// (`{"type": "...", "message": "..."}`) or as plain text.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive (e.g. "debug", "commsrelay=trace").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write a JSON snapshot of medium status to this path on shutdown.
    #[arg(long, value_name = "FILE")]
    pub status_snapshot: Option<PathBuf>,

    /// Disable the log medium regardless of configuration.
    #[arg(long)]
    pub no_log_medium: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(path) = &self.status_snapshot {
            dict.insert(
                "status_snapshot_path".into(),
                Value::from(path.display().to_string()),
            );
        }

        if self.no_log_medium {
            let mut log = Dict::new();
            log.insert("enabled".into(), Value::from(false));
            let mut comms = Dict::new();
            comms.insert("log".into(), Value::from(log));
            dict.insert("comms".into(), Value::from(comms));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
