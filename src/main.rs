//! commsrelay - relays events read from stdin to every enabled medium.

use anyhow::Result;
use clap::Parser;
use commsrelay::{app::App, cli::Cli, config::Config, core::Event};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        tracing_subscriber::fmt().init();
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    // RUST_LOG, when set, takes precedence over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("commsrelay starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Log Medium: {}", enabled_str(config.comms.log.enabled));
    info!("Slack: {}", enabled_str(config.comms.slack.enabled));
    info!("Telegram: {}", enabled_str(config.comms.telegram.enabled));
    info!("SMSGlobal: {}", enabled_str(config.comms.sms_global.enabled));
    match &config.status_snapshot_path {
        Some(path) => info!("Status Snapshot: {}", path.display()),
        None => info!("Status Snapshot: Disabled"),
    }
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (events_tx, events_rx) = async_channel::bounded::<Event>(config.event_queue_capacity);

    let app = App::builder(config).build().await?;

    // Events arrive one per line: JSON objects, or plain text treated as a message.
    let reader_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let event = serde_json::from_str::<Event>(line)
                        .unwrap_or_else(|_| Event::new("message", line));
                    if events_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    info!("Reached end of input.");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received. Shutting down gracefully...");
            let _ = shutdown_tx.send(true);
        }
    });

    let result = app.run(events_rx, shutdown_rx).await;
    reader_task.abort();

    info!("commsrelay exiting.");
    result
}

fn enabled_str(enabled: bool) -> &'static str {
    if enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}
