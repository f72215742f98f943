//! # lessonlink
//!
//! Terminal client: stream a subject's realtime events, print the effective
//! settings, or check how the offline cache routes a request path.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lessonlink_cache::{OfflineCache, Router};
use lessonlink_core::logging;
use lessonlink_realtime::{
    ConnectionConfig, LogNotificationSink, RealtimeConnection, WsTransport, events,
};
use lessonlink_settings::{
    LessonLinkSettings, get_settings, init_settings, load_settings_from_path, settings_path,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// LessonLink realtime client.
#[derive(Parser, Debug)]
#[command(name = "lessonlink", version, about = "LessonLink realtime client")]
struct Cli {
    /// Settings file (defaults to `~/.lessonlink/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream a subject's events to stdout as JSON lines until Ctrl-C.
    Watch {
        /// Subject (student or session) id.
        subject: String,

        /// Override the realtime base URL.
        #[arg(long)]
        url: Option<String>,

        /// Topic to subscribe to once connected (repeatable).
        #[arg(long = "topic")]
        topics: Vec<String>,
    },
    /// Print the effective settings as JSON.
    Settings,
    /// Show which cache partition and strategy a request path maps to.
    Route {
        /// Request path, e.g. `/api/lessons/7`.
        path: String,
    },
}

const WATCHED_EVENTS: [&str; 4] = [
    events::CONNECTED,
    events::DISCONNECTED,
    events::ERROR,
    events::MESSAGE,
];

fn load(path: Option<&Path>) -> Result<LessonLinkSettings> {
    let path = path.map_or_else(settings_path, Path::to_path_buf);
    load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

fn event_line(event: &str, payload: &Value) -> Value {
    json!({ "event": event, "payload": payload })
}

fn route_report(settings: &LessonLinkSettings, path: &str) -> Value {
    let router = Router::from_settings(&settings.cache.routes);
    let route = router.resolve(path);
    let cache = OfflineCache::from_settings(&settings.cache);
    let limit = route.partition.and_then(|name| {
        cache
            .stats()
            .into_iter()
            .find(|stats| stats.name == name)
            .map(|stats| stats.max_entries)
    });
    json!({
        "path": path,
        "partition": route.partition,
        "strategy": route.strategy,
        "maxEntries": limit,
    })
}

async fn watch(
    settings: &LessonLinkSettings,
    subject: String,
    url: Option<String>,
    topics: &[String],
) -> Result<()> {
    let mut config = ConnectionConfig::from(&settings.realtime);
    if let Some(url) = url {
        config.base_url = url;
    }

    let conn = RealtimeConnection::new(subject, config, Arc::new(WsTransport));
    conn.set_notifier(Arc::new(LogNotificationSink));

    for event in WATCHED_EVENTS {
        let _ = conn.on(event, move |payload| println!("{}", event_line(event, payload)));
    }

    let (connected_tx, mut connected_rx) = mpsc::unbounded_channel();
    let _ = conn.on(events::CONNECTED, move |_| {
        let _ = connected_tx.send(());
    });
    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel();
    let _ = conn.on(events::RECONNECT_FAILED, move |payload| {
        let _ = failed_tx.send(payload.clone());
    });

    tracing::info!(endpoint = %conn.endpoint(), "watching subject");
    if !conn.connect() {
        anyhow::bail!("connection could not be started");
    }

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                break signal.context("Failed to listen for Ctrl-C");
            }
            Some(()) = connected_rx.recv() => {
                for topic in topics {
                    if !conn.subscribe(topic) {
                        tracing::warn!(topic, "subscribe not sent");
                    }
                }
            }
            Some(payload) = failed_rx.recv() => {
                println!("{}", event_line(events::RECONNECT_FAILED, &payload));
                break Err(anyhow::anyhow!("gave up reconnecting: {payload}"));
            }
        }
    };

    conn.close().await;
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load(cli.settings.as_deref())?;
    if init_settings(loaded).is_err() {
        tracing::debug!("settings already initialized");
    }
    let settings = get_settings();

    if cli.json_logs || settings.logging.json {
        logging::init_json_subscriber(&settings.logging.level);
    } else {
        logging::init_subscriber(&settings.logging.level);
    }

    match cli.command {
        Command::Watch { subject, url, topics } => watch(settings, subject, url, &topics).await,
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(settings)?);
            Ok(())
        }
        Command::Route { path } => {
            println!("{}", route_report(settings, &path));
            Ok(())
        }
    }
}
