//! Offline cache settings: partition limits and request routing.

use std::collections::BTreeMap;

use lessonlink_core::constants::{DYNAMIC_PARTITION, LESSON_PARTITION, STATIC_PARTITION};
use serde::{Deserialize, Serialize};

/// How a routed request uses its partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchStrategy {
    /// Serve from cache when present; fetch and store on miss.
    CacheFirst,
    /// Fetch first; fall back to the cached copy when the network fails.
    NetworkFirst,
    /// Never touch the cache.
    #[default]
    NetworkOnly,
}

/// Limits for one cache partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionSettings {
    /// Maximum number of entries held at once.
    pub max_entries: usize,
    /// Optional ceiling on the summed body size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
}

impl PartitionSettings {
    /// Entry-count limit only.
    pub fn entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            max_bytes: None,
        }
    }
}

/// One routing rule.
///
/// `pattern` is a path prefix (`/api/lessons/`), or a suffix when written as
/// `*.ext` (`*.css`). Rules are tried in order; the first match wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSettings {
    /// Prefix or `*suffix` pattern.
    pub pattern: String,
    /// Target partition; ignored for [`FetchStrategy::NetworkOnly`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Strategy applied to matching requests.
    pub strategy: FetchStrategy,
}

impl RouteSettings {
    fn cached(pattern: &str, partition: &str, strategy: FetchStrategy) -> Self {
        Self {
            pattern: pattern.to_string(),
            partition: Some(partition.to_string()),
            strategy,
        }
    }
}

/// Offline cache settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Partition name → limits.
    pub partitions: BTreeMap<String, PartitionSettings>,
    /// Ordered routing rules.
    pub routes: Vec<RouteSettings>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let partitions = BTreeMap::from([
            (STATIC_PARTITION.to_string(), PartitionSettings::entries(100)),
            (DYNAMIC_PARTITION.to_string(), PartitionSettings::entries(50)),
            (LESSON_PARTITION.to_string(), PartitionSettings::entries(200)),
        ]);
        let routes = vec![
            RouteSettings::cached("/static/", STATIC_PARTITION, FetchStrategy::CacheFirst),
            RouteSettings::cached("*.js", STATIC_PARTITION, FetchStrategy::CacheFirst),
            RouteSettings::cached("*.css", STATIC_PARTITION, FetchStrategy::CacheFirst),
            RouteSettings::cached("/api/lessons/", LESSON_PARTITION, FetchStrategy::CacheFirst),
            RouteSettings::cached("/api/", DYNAMIC_PARTITION, FetchStrategy::NetworkFirst),
        ];
        Self { partitions, routes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_capped_below_lesson() {
        let s = CacheSettings::default();
        assert!(s.partitions[DYNAMIC_PARTITION].max_entries < s.partitions[LESSON_PARTITION].max_entries);
    }

    #[test]
    fn strategy_serde_camel_case() {
        let json = serde_json::to_string(&FetchStrategy::NetworkFirst).unwrap();
        assert_eq!(json, "\"networkFirst\"");
        let back: FetchStrategy = serde_json::from_str("\"cacheFirst\"").unwrap();
        assert_eq!(back, FetchStrategy::CacheFirst);
    }

    #[test]
    fn partition_settings_bytes_optional() {
        let p: PartitionSettings = serde_json::from_str(r#"{"maxEntries": 7}"#).unwrap();
        assert_eq!(p, PartitionSettings::entries(7));
        let p: PartitionSettings =
            serde_json::from_str(r#"{"maxEntries": 7, "maxBytes": 1024}"#).unwrap();
        assert_eq!(p.max_bytes, Some(1024));
    }

    #[test]
    fn default_routes_reference_known_partitions() {
        let s = CacheSettings::default();
        for route in &s.routes {
            let name = route.partition.as_deref().unwrap();
            assert!(s.partitions.contains_key(name), "unknown partition {name}");
        }
    }
}
