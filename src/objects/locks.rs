use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::containers::types::ContainerId;

const PRUNE_THRESHOLD: usize = 10_000;

type ObjectKey = (ContainerId, String);

/// Per-object async mutexes.
///
/// Every sequence that reads, mutates and possibly restores an object runs
/// while holding the object's guard, so two sequences on the same
/// `(container, key)` never interleave.
#[derive(Default)]
pub struct ObjectLocks {
    locks: DashMap<ObjectKey, Arc<Mutex<()>>>,
}

/// Holds one or more object locks until dropped.
pub struct ObjectGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ObjectLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Locks every key in `keys`. Keys are acquired in sorted order and
    /// duplicates are collapsed, so concurrent callers locking overlapping
    /// sets cannot deadlock.
    pub async fn lock(&self, container: &ContainerId, keys: &[&str]) -> ObjectGuard {
        let mut ordered: Vec<&str> = keys.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        if self.locks.len() > PRUNE_THRESHOLD {
            self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        }

        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            let mutex = self
                .locks
                .entry((container.clone(), key.to_string()))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value()
                .clone();
            guards.push(mutex.lock_owned().await);
        }

        ObjectGuard { _guards: guards }
    }
}
