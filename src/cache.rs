use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn default_ttl() -> Duration {
    Duration::minutes(5)
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Key/value store whose entries expire `ttl` after they were fetched.
#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V, C: Clock> TtlCache<K, V, C> {
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        let fetched_at = self.clock.now();
        self.entries.insert(key, CacheEntry { value, fetched_at });
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn purge_expired(&mut self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.fetched_at < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
