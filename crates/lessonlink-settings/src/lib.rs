//! # lessonlink-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`LessonLinkSettings::default()`]
//! 2. **User file** — `~/.lessonlink/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `LESSONLINK_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use lessonlink_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("realtime endpoint: {}", settings.realtime.url);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<LessonLinkSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.lessonlink/settings.json` with env
/// var overrides. If loading fails, the error is logged and compiled
/// defaults are used.
pub fn get_settings() -> &'static LessonLinkSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            LessonLinkSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: LessonLinkSettings) -> std::result::Result<(), LessonLinkSettings> {
    SETTINGS.set(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = LessonLinkSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = LessonLinkSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.realtime.reconnect_interval_ms, 3000);
        assert_eq!(settings.realtime.max_reconnect_attempts, 5);
        assert_eq!(settings.realtime.ping_interval_ms, 30_000);
        assert!(settings.realtime.pong_timeout_ms.is_none());
        assert_eq!(settings.cache.partitions.len(), 3);
        assert_eq!(settings.logging.level, "info");
    }
}
