//! Hash-sharded map with one `parking_lot::RwLock` per shard.
//!
//! Keys are routed to a shard by hash, so writers for unrelated keys lock
//! different shards. A check-and-insert on one key runs entirely under the
//! write lock of its shard and is therefore linearizable per key.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;

pub(crate) type Shard<V> = HashMap<String, V>;

pub struct ShardedMap<V> {
    shards: Box<[RwLock<Shard<V>>]>,
    hasher: RandomState,
}

impl<V> ShardedMap<V> {
    /// Creates a map with `shard_count` shards (at least one).
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for(&self, key: &str) -> &RwLock<Shard<V>> {
        let idx = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    /// Write-locks the shard owning `key`.
    pub(crate) fn write_shard(&self, key: &str) -> RwLockWriteGuard<'_, Shard<V>> {
        self.shard_for(key).write()
    }

    /// Read-locks every shard in index order and keeps all guards alive.
    ///
    /// Holding the returned guards gives a point-in-time view of the whole map.
    pub(crate) fn read_all(&self) -> Vec<RwLockReadGuard<'_, Shard<V>>> {
        self.shards.iter().map(|shard| shard.read()).collect()
    }

    /// Inserts `value` unless `key` is present. Returns the rejected value on conflict.
    pub fn insert_if_absent(&self, key: String, value: V) -> Result<(), V> {
        let mut shard = self.write_shard(&key);
        if shard.contains_key(&key) {
            return Err(value);
        }
        shard.insert(key, value);
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.shard_for(key).read().contains_key(key)
    }

    /// Runs `f` against the value under the shard's read lock.
    pub fn with<R>(&self, key: &str, f: impl FnOnce(Option<&V>) -> R) -> R {
        let shard = self.shard_for(key).read();
        f(shard.get(key))
    }

    /// Runs `f` against the value under the shard's write lock.
    pub fn with_mut<R>(&self, key: &str, f: impl FnOnce(Option<&mut V>) -> R) -> R {
        let mut shard = self.shard_for(key).write();
        f(shard.get_mut(key))
    }

    /// Visits every value, one shard at a time.
    ///
    /// Shards are locked in turn, so the visit is not a point-in-time view.
    pub fn for_each(&self, mut f: impl FnMut(&V)) {
        for shard in self.shards.iter() {
            shard.read().values().for_each(&mut f);
        }
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> ShardedMap<V> {
    pub fn get_cloned(&self, key: &str) -> Option<V> {
        self.with(key, |value| value.cloned())
    }
}
