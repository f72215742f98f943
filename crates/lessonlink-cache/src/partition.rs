//! A single capacity-limited partition with FIFO eviction.
//!
//! Entries live in a map keyed by request identity; insertion order lives in
//! a queue of `(key, seq)` markers. Invalidation only removes the map entry,
//! leaving a stale marker that eviction skips, so every operation stays O(1)
//! amortized. Overwriting a key keeps its original marker, so an entry's
//! eviction priority is fixed at first insertion.

use std::collections::{HashMap, VecDeque};

use lessonlink_settings::PartitionSettings;
use tracing::debug;

use crate::entry::{CacheEntry, CachedResponse};
use crate::error::{CacheError, Result};

/// Stale markers tolerated before the order queue is compacted.
const COMPACT_SLACK: usize = 32;

struct Slot {
    entry: CacheEntry,
    seq: u64,
}

/// One named partition.
pub struct Partition {
    name: String,
    max_entries: usize,
    max_bytes: Option<u64>,
    entries: HashMap<String, Slot>,
    order: VecDeque<(String, u64)>,
    next_seq: u64,
    total_bytes: u64,
}

impl Partition {
    /// Create an empty partition. A zero entry limit is treated as one.
    pub fn new(name: impl Into<String>, settings: &PartitionSettings) -> Self {
        Self {
            name: name.into(),
            max_entries: settings.max_entries.max(1),
            max_bytes: settings.max_bytes,
            entries: HashMap::new(),
            order: VecDeque::new(),
            next_seq: 0,
            total_bytes: 0,
        }
    }

    /// Partition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry ceiling.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Byte ceiling, if any.
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Live entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Summed body size of live entries.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Whether `key` is stored.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored entry for `key`.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).map(|slot| &slot.entry)
    }

    /// Live keys, oldest first.
    pub fn keys(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|(key, seq)| self.is_live(key, *seq))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Insert or overwrite `key`, then evict oldest entries until both limits
    /// hold. Returns the evicted keys.
    pub fn put(&mut self, key: impl Into<String>, response: CachedResponse) -> Result<Vec<String>> {
        let key = key.into();
        let size = response.size();
        if let Some(quota) = self.max_bytes {
            if size > quota {
                return Err(CacheError::QuotaExceeded {
                    partition: self.name.clone(),
                    size,
                    quota,
                });
            }
        }

        let entry = CacheEntry::new(response);
        if let Some(slot) = self.entries.get_mut(&key) {
            self.total_bytes = self.total_bytes - slot.entry.response.size() + size;
            slot.entry = entry;
        } else {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.order.push_back((key.clone(), seq));
            let _ = self.entries.insert(key.clone(), Slot { entry, seq });
            self.total_bytes += size;
        }

        let evicted = self.evict_over_limit(&key);
        if !evicted.is_empty() {
            debug!(partition = %self.name, evicted = evicted.len(), "evicted oldest entries");
        }
        Ok(evicted)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let Some(slot) = self.entries.remove(key) else {
            return false;
        };
        self.total_bytes -= slot.entry.response.size();
        self.maybe_compact();
        true
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
    }

    fn is_live(&self, key: &str, seq: u64) -> bool {
        self.entries.get(key).is_some_and(|slot| slot.seq == seq)
    }

    fn over_limit(&self) -> bool {
        self.entries.len() > self.max_entries
            || self.max_bytes.is_some_and(|quota| self.total_bytes > quota)
    }

    fn evict_over_limit(&mut self, keep: &str) -> Vec<String> {
        let mut evicted = Vec::new();
        let mut kept = None;
        while self.over_limit() {
            let Some((key, seq)) = self.order.pop_front() else {
                break;
            };
            if !self.is_live(&key, seq) {
                continue;
            }
            if key == keep {
                kept = Some((key, seq));
                continue;
            }
            if let Some(slot) = self.entries.remove(&key) {
                self.total_bytes -= slot.entry.response.size();
            }
            evicted.push(key);
        }
        if let Some(marker) = kept {
            self.order.push_front(marker);
        }
        evicted
    }

    fn maybe_compact(&mut self) {
        if self.order.len() > self.entries.len() * 2 + COMPACT_SLACK {
            let entries = &self.entries;
            self.order
                .retain(|(key, seq)| entries.get(key).is_some_and(|slot| slot.seq == *seq));
        }
    }
}

impl std::fmt::Debug for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition")
            .field("name", &self.name)
            .field("len", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .field("total_bytes", &self.total_bytes)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn partition(max_entries: usize) -> Partition {
        Partition::new("test", &PartitionSettings::entries(max_entries))
    }

    fn body(text: &'static str) -> CachedResponse {
        CachedResponse::new(200, text)
    }

    #[test]
    fn evicts_oldest_first() {
        let mut p = partition(3);
        for key in ["a", "b", "c"] {
            assert!(p.put(key, body(key)).unwrap().is_empty());
        }
        assert_eq!(p.put("d", body("d")).unwrap(), vec!["a"]);
        assert_eq!(p.keys(), vec!["b", "c", "d"]);
        assert!(p.get("a").is_none());
    }

    #[test]
    fn overwrite_keeps_first_insertion_position() {
        let mut p = partition(3);
        for key in ["a", "b", "c"] {
            let _ = p.put(key, body("v1")).unwrap();
        }
        let _ = p.put("a", body("v2")).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.get("a").unwrap().response.body, "v2");

        assert_eq!(p.put("d", body("d")).unwrap(), vec!["a"]);
        assert_eq!(p.keys(), vec!["b", "c", "d"]);
    }

    #[test]
    fn reinsert_after_invalidate_goes_to_back() {
        let mut p = partition(3);
        for key in ["a", "b", "c"] {
            let _ = p.put(key, body(key)).unwrap();
        }
        assert!(p.invalidate("a"));
        assert!(!p.invalidate("a"));
        let _ = p.put("a", body("a")).unwrap();
        assert_eq!(p.put("d", body("d")).unwrap(), vec!["b"]);
        assert_eq!(p.keys(), vec!["c", "a", "d"]);
    }

    #[test]
    fn clear_empties_partition() {
        let mut p = partition(3);
        let _ = p.put("a", body("abc")).unwrap();
        p.clear();
        assert!(p.is_empty());
        assert_eq!(p.total_bytes(), 0);
        assert!(p.keys().is_empty());
    }

    #[test]
    fn zero_limit_holds_one() {
        let mut p = partition(0);
        let _ = p.put("a", body("a")).unwrap();
        let _ = p.put("b", body("b")).unwrap();
        assert_eq!(p.keys(), vec!["b"]);
    }

    #[test]
    fn oversized_entry_rejected() {
        let mut p = Partition::new(
            "static",
            &PartitionSettings {
                max_entries: 10,
                max_bytes: Some(4),
            },
        );
        assert_matches!(
            p.put("big", body("too large")),
            Err(CacheError::QuotaExceeded { size: 9, quota: 4, .. })
        );
        assert!(p.is_empty());
    }

    #[test]
    fn byte_quota_evicts_oldest() {
        let mut p = Partition::new(
            "static",
            &PartitionSettings {
                max_entries: 10,
                max_bytes: Some(10),
            },
        );
        let _ = p.put("a", body("aaaa")).unwrap();
        let _ = p.put("b", body("bbbb")).unwrap();
        assert_eq!(p.put("c", body("cccc")).unwrap(), vec!["a"]);
        assert_eq!(p.total_bytes(), 8);
    }

    #[test]
    fn growing_overwrite_never_evicts_itself() {
        let mut p = Partition::new(
            "static",
            &PartitionSettings {
                max_entries: 10,
                max_bytes: Some(10),
            },
        );
        let _ = p.put("a", body("aa")).unwrap();
        let _ = p.put("b", body("bb")).unwrap();
        assert_eq!(p.put("a", body("aaaaaaaaa")).unwrap(), vec!["b"]);
        assert_eq!(p.keys(), vec!["a"]);
        assert_eq!(p.total_bytes(), 9);
    }

    #[test]
    fn stale_markers_are_compacted() {
        let mut p = partition(1000);
        for i in 0..200 {
            let key = format!("k{i}");
            let _ = p.put(key.clone(), body("x")).unwrap();
            assert!(p.invalidate(&key));
        }
        assert!(p.order.len() <= COMPACT_SLACK + 1);
    }

    proptest! {
        #[test]
        fn never_exceeds_limit(limit in 1usize..20, keys in prop::collection::vec(0u8..40, 0..200)) {
            let mut p = partition(limit);
            for key in keys {
                let _ = p.put(key.to_string(), body("v")).unwrap();
                prop_assert!(p.len() <= limit);
                prop_assert_eq!(p.keys().len(), p.len());
            }
        }

        #[test]
        fn limit_plus_one_distinct_inserts_drop_the_first(limit in 1usize..50) {
            let mut p = partition(limit);
            for i in 0..=limit {
                let _ = p.put(format!("k{i}"), body("v")).unwrap();
            }
            prop_assert_eq!(p.len(), limit);
            prop_assert!(!p.contains("k0"));
            let last_key = format!("k{limit}");
            prop_assert!(p.contains(&last_key));
        }
    }
}
