//! Keyed in-memory cache with read-time TTL evaluation.

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::clock::Clock;

/// A validated value and the moment it was fetched.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub fetched_at_ms: u64,
}

impl<V> CacheEntry<V> {
    /// Age relative to `now_ms`. Clock skew backwards reads as zero.
    pub fn age(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.fetched_at_ms))
    }

    pub fn is_fresh(&self, now_ms: u64, ttl: Duration) -> bool {
        self.age(now_ms) < ttl
    }
}

/// One key's storage. The entry is swapped as a whole, never edited.
struct CacheSlot<V> {
    entry: ArcSwapOption<CacheEntry<V>>,
}

impl<V> CacheSlot<V> {
    fn empty() -> Self {
        Self {
            entry: ArcSwapOption::empty(),
        }
    }
}

/// In-memory cache owned by a single provider.
///
/// The slot map is only written the first time a key is seen; after that
/// reads and writes go through the slot's atomic pointer.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: DashMap<K, Arc<CacheSlot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Latest entry for `key`, whatever its age.
    pub fn get(&self, key: &K) -> Option<Arc<CacheEntry<V>>> {
        self.slots.get(key).and_then(|slot| slot.entry.load_full())
    }

    /// Latest entry for `key` if it is still within the TTL.
    pub fn get_fresh(&self, key: &K) -> Option<Arc<CacheEntry<V>>> {
        let now = self.clock.now_ms();
        self.get(key).filter(|entry| entry.is_fresh(now, self.ttl))
    }

    /// Replace the entry for `key`, stamped with the current time.
    pub fn put(&self, key: K, value: Arc<V>) -> Arc<CacheEntry<V>> {
        let entry = Arc::new(CacheEntry {
            value,
            fetched_at_ms: self.clock.now_ms(),
        });
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(CacheSlot::empty()))
            .clone();
        slot.entry.store(Some(entry.clone()));
        entry
    }

    /// Every populated entry, in no particular order.
    pub fn snapshot(&self) -> Vec<(K, Arc<CacheEntry<V>>)> {
        self.slots
            .iter()
            .filter_map(|slot| {
                slot.value()
                    .entry
                    .load_full()
                    .map(|entry| (slot.key().clone(), entry))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().entry.load().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
