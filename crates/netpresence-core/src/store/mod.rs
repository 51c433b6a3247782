// ── Presence store ──
//
// Last-committed entity state plus the freshness flags readers check.
// Only the reconciler writes entities; readers never block it.

mod collection;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::filter::{normalize_ip, normalize_mac};
use crate::model::PresenceEntity;
use collection::EntityCollection;

/// Reactive store of presence entities for one router.
pub struct PresenceStore {
    pub(crate) entities: EntityCollection<PresenceEntity>,
    /// `false` after a failed fetch, until the next successful one.
    pub(crate) available: watch::Sender<bool>,
    pub(crate) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl PresenceStore {
    pub fn new() -> Self {
        let (available, _) = watch::channel(false);
        let (last_refresh, _) = watch::channel(None);

        Self {
            entities: EntityCollection::new(),
            available,
            last_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn entities_snapshot(&self) -> Arc<Vec<Arc<PresenceEntity>>> {
        self.entities.snapshot()
    }

    /// Entities ordered by numeric IP, for display.
    pub fn sorted_entities(&self) -> Vec<Arc<PresenceEntity>> {
        let mut entities: Vec<_> = self.entities_snapshot().iter().cloned().collect();
        entities.sort_by_key(|e| crate::model::ip_sort_key(&e.ip));
        entities
    }

    pub fn entity(&self, ip: &str) -> Option<Arc<PresenceEntity>> {
        self.entities.get_by_key(&normalize_ip(ip))
    }

    pub fn entity_by_mac(&self, mac: &str) -> Option<Arc<PresenceEntity>> {
        self.entities.get_by_secondary(&normalize_mac(mac))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<PresenceEntity>>>> {
        self.entities.subscribe()
    }

    // ── Freshness ────────────────────────────────────────────────────

    pub fn available(&self) -> bool {
        *self.available.borrow()
    }

    pub fn subscribe_available(&self) -> watch::Receiver<bool> {
        self.available.subscribe()
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.send_if_modified(|current| {
            let changed = *current != available;
            *current = available;
            changed
        });
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub(crate) fn mark_refreshed(&self, at: DateTime<Utc>) {
        self.last_refresh.send_modify(|ts| *ts = Some(at));
    }
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new()
    }
}
