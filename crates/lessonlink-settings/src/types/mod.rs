//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON
//! settings file. Section types carry `#[serde(default)]` so partial JSON
//! fills the missing fields from [`Default`].

mod cache;
mod realtime;

pub use cache::*;
pub use realtime::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "realtime": { "url": "wss://learn.example.com/ws/progress" },
///   "cache": { "partitions": { "dynamic": { "maxEntries": 20 } } },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonLinkSettings {
    /// Push-update connection settings.
    pub realtime: RealtimeSettings,
    /// Offline cache partitions and routing.
    pub cache: CacheSettings,
    /// Logging output.
    pub logging: LoggingSettings,
}

impl LessonLinkSettings {
    /// Reject values the runtime cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.realtime.url.trim().is_empty() {
            return Err(SettingsError::InvalidValue("realtime.url is empty".into()));
        }
        if self.realtime.ping_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "realtime.pingIntervalMs must be positive".into(),
            ));
        }
        if self.realtime.pong_timeout_ms == Some(0) {
            return Err(SettingsError::InvalidValue(
                "realtime.pongTimeoutMs must be positive".into(),
            ));
        }
        if self.realtime.outbound_buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "realtime.outboundBuffer must be positive".into(),
            ));
        }
        for (name, partition) in &self.cache.partitions {
            if partition.max_entries == 0 {
                return Err(SettingsError::InvalidValue(format!(
                    "cache.partitions.{name}.maxEntries must be positive"
                )));
            }
        }
        for route in &self.cache.routes {
            if route.strategy == FetchStrategy::NetworkOnly {
                continue;
            }
            match route.partition.as_deref() {
                Some(name) if self.cache.partitions.contains_key(name) => {}
                Some(name) => {
                    return Err(SettingsError::InvalidValue(format!(
                        "route {} targets unknown partition {name}",
                        route.pattern
                    )));
                }
                None => {
                    return Err(SettingsError::InvalidValue(format!(
                        "route {} needs a partition",
                        route.pattern
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Logging output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`trace`..`error`, or any `EnvFilter` directive).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
