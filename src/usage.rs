// File: src/usage.rs
use crate::core::types::ALL;
use crate::persistence::{load_or_default, save_logged, KeyValueStore, USAGE_STATS_KEY};
use std::collections::HashMap;
use tracing::debug;

/// How often each size facet value was chosen. Counts only grow and only
/// affect facet ordering.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    counts: HashMap<String, u64>,
}

impl UsageTracker {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            counts: load_or_default(store, USAGE_STATS_KEY),
        }
    }

    /// Bumps the counter for `size` and persists the whole mapping. The "All"
    /// sentinel is not a size and is never counted.
    pub fn record(&mut self, store: &mut dyn KeyValueStore, size: &str) {
        if size == ALL || size.is_empty() {
            return;
        }
        let count = self.counts.entry(size.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        debug!("size `{size}` chosen {count} times");

        save_logged(store, USAGE_STATS_KEY, &self.counts);
    }

    pub fn count(&self, size: &str) -> u64 {
        self.counts.get(size).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> &HashMap<String, u64> {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_record_increments_and_persists() {
        let mut store = MemoryStore::new();
        let mut usage = UsageTracker::load(&store);
        usage.record(&mut store, "Trenta");
        usage.record(&mut store, "Trenta");
        usage.record(&mut store, "Short");

        let reloaded = UsageTracker::load(&store);
        assert_eq!(reloaded.count("Trenta"), 2);
        assert_eq!(reloaded.count("Short"), 1);
        assert_eq!(reloaded.count("Venti"), 0);
    }

    #[test]
    fn test_all_sentinel_not_counted() {
        let mut store = MemoryStore::new();
        let mut usage = UsageTracker::load(&store);
        usage.record(&mut store, ALL);
        assert!(usage.snapshot().is_empty());
    }

    #[test]
    fn test_corrupt_state_is_all_zero() {
        let mut store = MemoryStore::new();
        store.set(USAGE_STATS_KEY, "[\"Tall\"]").unwrap();
        let usage = UsageTracker::load(&store);
        assert!(usage.snapshot().is_empty());
        assert_eq!(usage.count("Tall"), 0);
    }
}
