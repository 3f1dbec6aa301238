//! In-process cache for default list views.
//!
//! Every mutating action invalidates the key of the list it touched, so the
//! next fetch goes back to the database. The TTL bounds staleness from writers
//! in other processes.
//!
//! Each key carries a generation that `invalidate` bumps. A reader captures it
//! with `generation` before querying and stores its rows with
//! `put_if_generation`, which drops them if a writer invalidated the key in
//! between.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CachedList<V> {
    value: V,
    fetched_at: Instant,
}

struct Slot<V> {
    generation: u64,
    cached: Option<CachedList<V>>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            generation: 0,
            cached: None,
        }
    }
}

pub struct ListCache<V> {
    slots: RwLock<HashMap<String, Slot<V>>>,
    ttl: Duration,
}

impl<V: Clone> ListCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let slots = self.slots.read().await;
        slots
            .get(key)
            .and_then(|slot| slot.cached.as_ref())
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.value.clone())
    }

    /// Current generation of `key`; capture before reading the database
    pub async fn generation(&self, key: &str) -> u64 {
        let slots = self.slots.read().await;
        slots.get(key).map_or(0, |slot| slot.generation)
    }

    /// Store `value` unless `key` was invalidated after `generation` was read.
    ///
    /// Returns whether the value was stored.
    pub async fn put_if_generation(&self, key: &str, generation: u64, value: V) -> bool {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.to_string()).or_default();
        if slot.generation != generation {
            tracing::debug!(
                "Dropped stale list for {} (generation {} != {})",
                key,
                generation,
                slot.generation
            );
            return false;
        }

        slot.cached = Some(CachedList {
            value,
            fetched_at: Instant::now(),
        });
        true
    }

    pub async fn invalidate(&self, key: &str) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.to_string()).or_default();
        slot.generation = slot.generation.wrapping_add(1);
        if slot.cached.take().is_some() {
            tracing::debug!("Invalidated list cache: {}", key);
        }
    }
}

impl<V> std::fmt::Debug for ListCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListCache").field("ttl", &self.ttl).finish()
    }
}
