//! Bounded cache of transactions known to overflow a module limit.
//!
//! Shared between block building (the single writer) and pool admission
//! (many concurrent readers). The whole cache state is an immutable
//! snapshot behind an [`ArcSwap`]: readers load it without locking and
//! never observe a partially applied update; the writer publishes a new
//! snapshot built from persistent `im` maps, so each update costs
//! O(log n) rather than a full copy.
//!
//! Presence is trusted without re-verification; absence implies nothing.

use arc_swap::ArcSwap;
use tracelimit_config::{EvictionPolicy, RejectionCacheConfig};
use tracelimit_types::{Hash, ModuleName};
use tracing::{debug, trace};

/// Why a cached transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRejection {
    /// Module whose per-transaction limit was exceeded.
    pub module: ModuleName,
    /// Limits generation the rejection was decided under.
    pub limits_generation: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    rejection: CachedRejection,
    /// Position in eviction order.
    seq: u64,
}

#[derive(Debug, Clone, Default)]
struct CacheState {
    entries: im::HashMap<Hash, Entry>,
    /// Eviction order: lowest sequence number goes first.
    order: im::OrdMap<u64, Hash>,
    next_seq: u64,
}

impl CacheState {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn insert(
        &mut self,
        hash: Hash,
        rejection: CachedRejection,
        keep_position: bool,
        capacity: usize,
        evicted: &mut Vec<Hash>,
    ) {
        let seq = match self.entries.get(&hash).map(|e| e.seq) {
            Some(seq) if keep_position => seq,
            Some(old) => {
                self.order.remove(&old);
                self.next_seq()
            }
            None => self.next_seq(),
        };
        self.entries.insert(hash, Entry { rejection, seq });
        self.order.insert(seq, hash);

        while self.entries.len() > capacity {
            let Some((oldest, victim)) = self.order.get_min().cloned() else {
                break;
            };
            self.order.remove(&oldest);
            self.entries.remove(&victim);
            evicted.push(victim);
        }
    }

    fn touch(&mut self, hash: &Hash) {
        let Some(entry) = self.entries.get(hash).cloned() else {
            return;
        };
        self.order.remove(&entry.seq);
        let seq = self.next_seq();
        self.order.insert(seq, *hash);
        self.entries.insert(
            *hash,
            Entry {
                rejection: entry.rejection,
                seq,
            },
        );
    }
}

/// Bounded map from transaction hash to the module it overflowed.
///
/// Entries are only ever inserted or evicted for capacity, never removed
/// explicitly. A capacity of zero disables caching.
#[derive(Debug)]
pub struct RejectionCache {
    state: ArcSwap<CacheState>,
    capacity: usize,
    policy: EvictionPolicy,
    invalidate_on_limits_reload: bool,
}

impl RejectionCache {
    /// Create an empty cache from its settings.
    pub fn new(config: &RejectionCacheConfig) -> Self {
        Self {
            state: ArcSwap::from_pointee(CacheState::default()),
            capacity: config.capacity,
            policy: config.eviction,
            invalidate_on_limits_reload: config.invalidate_on_limits_reload,
        }
    }

    /// Create an insertion-ordered cache of the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(&RejectionCacheConfig {
            capacity,
            ..RejectionCacheConfig::default()
        })
    }

    /// Remember that `hash` overflowed `module` under `limits_generation`.
    ///
    /// Overwrites an existing entry. When full, evicts the oldest entry
    /// first (by insertion or by access, per the configured policy).
    pub fn remember(&self, hash: Hash, module: ModuleName, limits_generation: u64) {
        if self.capacity == 0 {
            return;
        }

        let rejection = CachedRejection {
            module,
            limits_generation,
        };
        let keep_position = self.policy == EvictionPolicy::InsertionOrder;
        let mut evicted = Vec::new();

        self.state.rcu(|current| {
            evicted.clear();
            let mut next = CacheState::clone(current);
            next.insert(
                hash,
                rejection.clone(),
                keep_position,
                self.capacity,
                &mut evicted,
            );
            next
        });

        debug!(
            tx = %hash,
            module = %rejection.module,
            limits_generation,
            evicted = evicted.len(),
            "Remembered line count overflow"
        );
    }

    /// Whether `hash` is cached, regardless of limits generation.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.state.load().entries.contains_key(hash)
    }

    /// Cached entry for `hash`, regardless of limits generation.
    pub fn peek(&self, hash: &Hash) -> Option<CachedRejection> {
        self.state
            .load()
            .entries
            .get(hash)
            .map(|e| e.rejection.clone())
    }

    /// Cached rejection still valid under `limits_generation`.
    ///
    /// Pure read: never affects eviction order. Safe for pool admission.
    pub fn get(&self, hash: &Hash, limits_generation: u64) -> Option<CachedRejection> {
        let rejection = self.peek(hash)?;
        if self.invalidate_on_limits_reload && rejection.limits_generation != limits_generation {
            trace!(
                tx = %hash,
                cached_generation = rejection.limits_generation,
                limits_generation,
                "Ignoring rejection cached under older limits"
            );
            return None;
        }
        Some(rejection)
    }

    /// Like [`get`](Self::get), but refreshes recency under
    /// [`EvictionPolicy::AccessOrder`]. Used by block building.
    pub fn lookup(&self, hash: &Hash, limits_generation: u64) -> Option<CachedRejection> {
        let rejection = self.get(hash, limits_generation)?;
        if self.policy == EvictionPolicy::AccessOrder {
            self.state.rcu(|current| {
                let mut next = CacheState::clone(current);
                next.touch(hash);
                next
            });
        }
        Some(rejection)
    }

    /// Number of cached entries, stale ones included.
    pub fn len(&self) -> usize {
        self.state.load().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured eviction policy.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn h(n: u64) -> Hash {
        Hash::from_bytes(&n.to_le_bytes())
    }

    #[test]
    fn test_oldest_entry_evicted_at_capacity() {
        let cache = RejectionCache::with_capacity(5);
        cache.remember(h(0), "EXT".into(), 0);
        assert!(cache.contains(&h(0)));

        for n in 1..=4 {
            cache.remember(h(n), "EXT".into(), 0);
        }
        assert!(cache.contains(&h(0)));
        assert_eq!(cache.len(), 5);

        cache.remember(h(5), "EXT".into(), 0);
        assert!(!cache.contains(&h(0)));
        assert!(cache.contains(&h(5)));
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_overwrite_keeps_insertion_position() {
        let cache = RejectionCache::with_capacity(2);
        cache.remember(h(0), "EXT".into(), 0);
        cache.remember(h(1), "EXT".into(), 0);
        cache.remember(h(0), "MUL".into(), 0);
        assert_eq!(cache.peek(&h(0)).unwrap().module, ModuleName::from("MUL"));

        cache.remember(h(2), "EXT".into(), 0);
        assert!(!cache.contains(&h(0)));
        assert!(cache.contains(&h(1)));
    }

    #[test]
    fn test_insertion_order_ignores_lookups() {
        let cache = RejectionCache::with_capacity(2);
        cache.remember(h(0), "EXT".into(), 0);
        cache.remember(h(1), "EXT".into(), 0);
        assert!(cache.lookup(&h(0), 0).is_some());

        cache.remember(h(2), "EXT".into(), 0);
        assert!(!cache.contains(&h(0)));
    }

    #[test]
    fn test_access_order_refreshes_on_lookup() {
        let cache = RejectionCache::new(&RejectionCacheConfig {
            capacity: 2,
            eviction: EvictionPolicy::AccessOrder,
            invalidate_on_limits_reload: true,
        });
        cache.remember(h(0), "EXT".into(), 0);
        cache.remember(h(1), "EXT".into(), 0);
        assert!(cache.lookup(&h(0), 0).is_some());
        // Pure reads never refresh.
        assert!(cache.get(&h(1), 0).is_some());

        cache.remember(h(2), "EXT".into(), 0);
        assert!(cache.contains(&h(0)));
        assert!(!cache.contains(&h(1)));
    }

    #[test]
    fn test_stale_generation_ignored_when_invalidating() {
        let cache = RejectionCache::with_capacity(4);
        cache.remember(h(0), "EXT".into(), 3);

        assert!(cache.get(&h(0), 3).is_some());
        assert!(cache.get(&h(0), 4).is_none());
        assert!(cache.contains(&h(0)));

        let keep = RejectionCache::new(&RejectionCacheConfig {
            capacity: 4,
            eviction: EvictionPolicy::InsertionOrder,
            invalidate_on_limits_reload: false,
        });
        keep.remember(h(0), "EXT".into(), 3);
        assert_eq!(keep.get(&h(0), 4).unwrap().limits_generation, 3);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = RejectionCache::with_capacity(0);
        cache.remember(h(0), "EXT".into(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_with_single_writer() {
        let cache = Arc::new(RejectionCache::with_capacity(64));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for round in 0..5_000u64 {
                        let n = round % 512;
                        if let Some(rejection) = cache.peek(&h(n)) {
                            assert_eq!(rejection.module, ModuleName::from("EXT"));
                        }
                        assert!(cache.len() <= 64);
                    }
                })
            })
            .collect();

        for n in 0..512 {
            cache.remember(h(n), "EXT".into(), 0);
        }
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        assert!(cache.contains(&h(511)));
        assert!(!cache.contains(&h(447)));
    }
}
