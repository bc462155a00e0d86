//! Per-program build serialization
//!
//! Two concurrent requests to rebuild the same program would race on
//! last-writer-wins for the published manifest. Holding a per-(world, lmid)
//! lock from change detection through publish serializes them within this
//! process. Cross-process coordination is deliberately out of scope.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of in-process build locks keyed by `world:lmid`.
#[derive(Debug, Clone, Default)]
pub struct BuildLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl BuildLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the build lock for a program, waiting if another run for the
    /// same program holds it. The guard releases on drop.
    pub async fn acquire(&self, world: &str, lmid: u32) -> OwnedMutexGuard<()> {
        let key = format!("{}:{}", world, lmid);
        let lock = {
            let mut registry = self.inner.lock().await;
            // Entries with no holder or waiter (strong count 1, the registry's
            // own reference) are stale; prune them so the registry stays
            // bounded by the number of programs currently building
            registry.retain(|k, entry| *k == key || Arc::strong_count(entry) > 1);
            registry
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}
