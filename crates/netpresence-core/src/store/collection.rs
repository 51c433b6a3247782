// ── Reactive entity collection ──
//
// Concurrent storage with O(1) lookups and push-based change notification
// via `watch` channels. Entities are never removed once inserted.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent, reactive collection for a single entity type.
///
/// Primary keys are normalized IPs. An optional secondary key (the MAC)
/// maps back to the primary key for lookups. Every published mutation
/// bumps a version counter and rebuilds the snapshot subscribers receive.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,

    /// Secondary index: MAC -> IP.
    secondary: DashMap<String, String>,

    version: watch::Sender<u64>,

    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            secondary: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace an entity and publish. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, secondary: Option<String>, entity: T) -> bool {
        let is_new = self.upsert_silent(key, secondary, entity);
        self.flush();
        is_new
    }

    /// Insert or replace without publishing. Call [`flush`](Self::flush)
    /// once the batch is complete so subscribers see it as one update.
    pub(crate) fn upsert_silent(&self, key: String, secondary: Option<String>, entity: T) -> bool {
        if let Some(secondary) = secondary {
            self.secondary.insert(secondary, key.clone());
        }
        self.by_key.insert(key, Arc::new(entity)).is_none()
    }

    /// Rebuild the snapshot and notify subscribers.
    pub(crate) fn flush(&self) {
        self.rebuild_snapshot();
        self.bump_version();
    }

    pub(crate) fn get_by_key(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Look up an entity through the secondary index.
    pub(crate) fn get_by_secondary(&self, secondary: &str) -> Option<Arc<T>> {
        let key = self.secondary.get(secondary)?;
        self.get_by_key(key.value())
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    #[allow(dead_code)]
    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.by_key.iter().map(|r| r.key().clone()).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
