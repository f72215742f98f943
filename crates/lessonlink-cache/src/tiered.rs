//! The set of named partitions behind one lock.

use std::collections::HashMap;

use lessonlink_settings::{CacheSettings, PartitionSettings};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::entry::{CacheEntry, CachedResponse};
use crate::error::{CacheError, Result};
use crate::partition::Partition;

/// Point-in-time counters for one partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionStats {
    /// Partition name.
    pub name: String,
    /// Live entries.
    pub entries: usize,
    /// Entry ceiling.
    pub max_entries: usize,
    /// Summed body size.
    pub bytes: u64,
    /// Byte ceiling, if any.
    pub max_bytes: Option<u64>,
}

/// Tiered offline cache: independent partitions, each with its own limits.
#[derive(Debug, Default)]
pub struct OfflineCache {
    partitions: Mutex<HashMap<String, Partition>>,
}

impl OfflineCache {
    /// A cache with no partitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache with one partition per configured entry.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let cache = Self::new();
        for (name, limits) in &settings.partitions {
            cache.add_partition(name.clone(), limits);
        }
        info!(partitions = settings.partitions.len(), "offline cache ready");
        cache
    }

    /// Add (or replace) a partition.
    pub fn add_partition(&self, name: impl Into<String>, limits: &PartitionSettings) {
        let name = name.into();
        debug!(partition = %name, max_entries = limits.max_entries, "partition added");
        let partition = Partition::new(name.clone(), limits);
        let _ = self.partitions.lock().insert(name, partition);
    }

    /// Configured partition names, sorted.
    pub fn partition_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.partitions.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Entry for `key` in `partition`, or `None` on a miss.
    pub fn get(&self, partition: &str, key: &str) -> Result<Option<CacheEntry>> {
        self.with_partition(partition, |p| p.get(key).cloned())
    }

    /// Store `response` under `key`, evicting the oldest entries past the
    /// partition's limits. Returns how many entries were evicted.
    pub fn put(&self, partition: &str, key: &str, response: CachedResponse) -> Result<usize> {
        self.with_partition(partition, |p| p.put(key, response))?
            .map(|evicted| evicted.len())
    }

    /// Drop `key` from `partition`. Returns whether it was present.
    pub fn invalidate(&self, partition: &str, key: &str) -> Result<bool> {
        self.with_partition(partition, |p| p.invalidate(key))
    }

    /// Empty one partition.
    pub fn clear(&self, partition: &str) -> Result<()> {
        self.with_partition(partition, Partition::clear)?;
        debug!(partition, "partition cleared");
        Ok(())
    }

    /// Empty every partition.
    pub fn clear_all(&self) {
        for partition in self.partitions.lock().values_mut() {
            partition.clear();
        }
    }

    /// Live entries in `partition`.
    pub fn len(&self, partition: &str) -> Result<usize> {
        self.with_partition(partition, |p| p.len())
    }

    /// Counters for every partition, sorted by name.
    pub fn stats(&self) -> Vec<PartitionStats> {
        let mut stats: Vec<PartitionStats> = self
            .partitions
            .lock()
            .values()
            .map(|p| PartitionStats {
                name: p.name().to_owned(),
                entries: p.len(),
                max_entries: p.max_entries(),
                bytes: p.total_bytes(),
                max_bytes: p.max_bytes(),
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    fn with_partition<T>(&self, name: &str, f: impl FnOnce(&mut Partition) -> T) -> Result<T> {
        let mut partitions = self.partitions.lock();
        let partition = partitions
            .get_mut(name)
            .ok_or_else(|| CacheError::UnknownPartition(name.to_owned()))?;
        Ok(f(partition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use lessonlink_core::constants::{DYNAMIC_PARTITION, LESSON_PARTITION, STATIC_PARTITION};

    fn cache() -> OfflineCache {
        OfflineCache::from_settings(&CacheSettings::default())
    }

    #[test]
    fn default_partitions_present() {
        assert_eq!(
            cache().partition_names(),
            vec![DYNAMIC_PARTITION, LESSON_PARTITION, STATIC_PARTITION]
        );
    }

    #[test]
    fn put_get_roundtrip() {
        let cache = cache();
        let response = CachedResponse::new(200, "body").with_header("etag", "v1");
        assert_eq!(cache.put(LESSON_PARTITION, "/api/lessons/7", response.clone()).unwrap(), 0);
        let entry = cache.get(LESSON_PARTITION, "/api/lessons/7").unwrap().unwrap();
        assert_eq!(entry.response, response);
        assert!(cache.get(LESSON_PARTITION, "/api/lessons/8").unwrap().is_none());
    }

    #[test]
    fn partitions_are_independent() {
        let cache = OfflineCache::new();
        cache.add_partition("small", &PartitionSettings::entries(1));
        cache.add_partition("large", &PartitionSettings::entries(10));

        let _ = cache.put("large", "k", CachedResponse::new(200, "large")).unwrap();
        let _ = cache.put("small", "a", CachedResponse::new(200, "a")).unwrap();
        assert_eq!(cache.put("small", "b", CachedResponse::new(200, "b")).unwrap(), 1);

        assert_eq!(cache.len("small").unwrap(), 1);
        assert!(cache.get("large", "k").unwrap().is_some());
        assert!(cache.get("small", "k").unwrap().is_none());
    }

    #[test]
    fn unknown_partition_is_an_error() {
        let cache = cache();
        assert_matches!(
            cache.get("videos", "x"),
            Err(CacheError::UnknownPartition(name)) if name == "videos"
        );
        assert_matches!(cache.clear("videos"), Err(CacheError::UnknownPartition(_)));
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = cache();
        let _ = cache.put(STATIC_PARTITION, "/static/app.js", CachedResponse::new(200, "js")).unwrap();
        let _ = cache.put(STATIC_PARTITION, "/static/app.css", CachedResponse::new(200, "css")).unwrap();

        assert!(cache.invalidate(STATIC_PARTITION, "/static/app.js").unwrap());
        assert!(!cache.invalidate(STATIC_PARTITION, "/static/app.js").unwrap());
        assert_eq!(cache.len(STATIC_PARTITION).unwrap(), 1);

        cache.clear(STATIC_PARTITION).unwrap();
        assert_eq!(cache.len(STATIC_PARTITION).unwrap(), 0);
    }

    #[test]
    fn stats_report_limits() {
        let cache = cache();
        let _ = cache.put(DYNAMIC_PARTITION, "/api/me", CachedResponse::new(200, "abc")).unwrap();
        let stats = cache.stats();
        let dynamic = stats.iter().find(|s| s.name == DYNAMIC_PARTITION).unwrap();
        assert_eq!(dynamic.entries, 1);
        assert_eq!(dynamic.max_entries, 50);
        assert_eq!(dynamic.bytes, 3);

        cache.clear_all();
        assert!(cache.stats().iter().all(|s| s.entries == 0));
    }
}
