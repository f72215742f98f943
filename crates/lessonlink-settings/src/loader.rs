//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LessonLinkSettings::default()`]
//! 2. If `~/.lessonlink/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::LessonLinkSettings;

/// Resolve the path to the settings file (`~/.lessonlink/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".lessonlink").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LessonLinkSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. Invalid JSON or values
/// that fail validation are errors.
pub fn load_settings_from_path(path: &Path) -> Result<LessonLinkSettings> {
    let mut settings = read_layered(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn read_layered(path: &Path) -> Result<LessonLinkSettings> {
    let defaults = serde_json::to_value(LessonLinkSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut LessonLinkSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
fn apply_overrides_from(
    settings: &mut LessonLinkSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let env = EnvReader { lookup };

    // ── Realtime ────────────────────────────────────────────────────
    if let Some(v) = env.string("LESSONLINK_WS_URL") {
        settings.realtime.url = v;
    }
    if let Some(v) = env.u64("LESSONLINK_RECONNECT_INTERVAL_MS", 100, 600_000) {
        settings.realtime.reconnect_interval_ms = v;
    }
    if let Some(v) = env.u32("LESSONLINK_MAX_RECONNECT_ATTEMPTS", 0, 100) {
        settings.realtime.max_reconnect_attempts = v;
    }
    if let Some(v) = env.u64("LESSONLINK_PING_INTERVAL_MS", 1000, 600_000) {
        settings.realtime.ping_interval_ms = v;
    }
    if let Some(v) = env.u64("LESSONLINK_PONG_TIMEOUT_MS", 1000, 3_600_000) {
        settings.realtime.pong_timeout_ms = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("LESSONLINK_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("LESSONLINK_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Variable readers ────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u32(&self, name: &str, min: u32, max: u32) -> Option<u32> {
        let val = (self.lookup)(name)?;
        let result = parse_u32_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "realtime": {"url": "ws://a", "pingIntervalMs": 30000}
        });
        let source = serde_json::json!({
            "realtime": {"pingIntervalMs": 5000}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["realtime"]["pingIntervalMs"], 5000);
        assert_eq!(merged["realtime"]["url"], "ws://a");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4, 5]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["items"], serde_json::json!([4, 5]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = read_layered(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, LessonLinkSettings::default());
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"realtime": {"maxReconnectAttempts": 2}, "cache": {"partitions": {"dynamic": {"maxEntries": 10}}}}"#,
        )
        .unwrap();

        let settings = read_layered(&path).unwrap();
        assert_eq!(settings.realtime.max_reconnect_attempts, 2);
        assert_eq!(settings.realtime.reconnect_interval_ms, 3000);
        assert_eq!(settings.cache.partitions["dynamic"].max_entries, 10);
        // sibling partitions survive the merge
        assert_eq!(settings.cache.partitions["lesson"].max_entries, 200);
    }

    #[test]
    fn load_adds_new_partition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"cache": {"partitions": {"media": {"maxEntries": 5, "maxBytes": 1048576}}}}"#,
        )
        .unwrap();

        let settings = read_layered(&path).unwrap();
        assert_eq!(settings.cache.partitions.len(), 4);
        assert_eq!(settings.cache.partitions["media"].max_bytes, Some(1_048_576));
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"cache": {"partitions": {"lesson": {"maxEntries": 0}}}}"#)
            .unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::InvalidValue(_)));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn overrides_apply_valid_values() {
        let mut settings = LessonLinkSettings::default();
        apply_overrides_from(
            &mut settings,
            vars(&[
                ("LESSONLINK_WS_URL", "wss://learn.example.com/ws"),
                ("LESSONLINK_RECONNECT_INTERVAL_MS", "500"),
                ("LESSONLINK_MAX_RECONNECT_ATTEMPTS", "0"),
                ("LESSONLINK_PONG_TIMEOUT_MS", "60000"),
                ("LESSONLINK_LOG_JSON", "yes"),
            ]),
        );
        assert_eq!(settings.realtime.url, "wss://learn.example.com/ws");
        assert_eq!(settings.realtime.reconnect_interval_ms, 500);
        assert_eq!(settings.realtime.max_reconnect_attempts, 0);
        assert_eq!(settings.realtime.pong_timeout_ms, Some(60_000));
        assert!(settings.logging.json);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut settings = LessonLinkSettings::default();
        apply_overrides_from(
            &mut settings,
            vars(&[
                ("LESSONLINK_WS_URL", ""),
                ("LESSONLINK_PING_INTERVAL_MS", "5"),
                ("LESSONLINK_MAX_RECONNECT_ATTEMPTS", "many"),
                ("LESSONLINK_LOG_JSON", "maybe"),
            ]),
        );
        assert_eq!(settings, LessonLinkSettings::default());
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in &["true", "1", "yes", "on", "TRUE", "On"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "no", "off", "NO"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u32_range("5", 0, 100), Some(5));
        assert_eq!(parse_u32_range("101", 0, 100), None);
        assert_eq!(parse_u64_range("30000", 1000, 600_000), Some(30_000));
        assert_eq!(parse_u64_range("500", 1000, 600_000), None);
        assert_eq!(parse_u64_range("abc", 1000, 600_000), None);
    }
}
