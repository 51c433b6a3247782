// ── Reconciler ──
//
// Merges a freshly fetched host table into the long-lived entity set.
// Entities are created on first sighting, refreshed while present and
// flipped offline when they vanish. Nothing is ever removed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::FilterConfig;
use crate::filter::{is_disabled, normalize_ip, resolve_name};
use crate::model::{DeviceRow, MacAddress, PresenceEntity, ip_sort_key};
use crate::presence::decide;
use crate::sink::PresenceSink;
use crate::store::PresenceStore;

/// What one [`Reconciler::apply`] call changed, by IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Devices seen for the first time.
    pub created: Vec<String>,
    /// Known devices still in the table whose connection state flipped.
    pub updated: Vec<String>,
    /// Known devices missing from the table that were connected before.
    pub went_offline: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.went_offline.is_empty()
    }

    fn sort(&mut self) {
        for list in [&mut self.created, &mut self.updated, &mut self.went_offline] {
            list.sort_by_key(|ip| ip_sort_key(ip));
        }
    }
}

/// Single writer for a [`PresenceStore`].
///
/// Callers must serialize `apply` calls; the [`Monitor`](crate::Monitor)
/// does this with a mutex around the reconciler.
pub struct Reconciler {
    store: Arc<PresenceStore>,
    sink: Arc<dyn PresenceSink>,
    /// IPs excluded at discovery. Never revisited.
    skipped: HashSet<String>,
}

impl Reconciler {
    pub fn new(store: Arc<PresenceStore>, sink: Arc<dyn PresenceSink>) -> Self {
        Self {
            store,
            sink,
            skipped: HashSet::new(),
        }
    }

    pub fn store(&self) -> &Arc<PresenceStore> {
        &self.store
    }

    /// IPs that were disabled when first seen, sorted.
    pub fn skipped(&self) -> Vec<String> {
        let mut skipped: Vec<_> = self.skipped.iter().cloned().collect();
        skipped.sort_by_key(|ip| ip_sort_key(ip));
        skipped
    }

    pub fn apply(&mut self, table: &[DeviceRow], filters: &FilterConfig) -> ReconcileReport {
        self.apply_at(table, filters, Utc::now())
    }

    /// [`apply`](Self::apply) with an explicit observation time.
    pub fn apply_at(
        &mut self,
        table: &[DeviceRow],
        filters: &FilterConfig,
        now: DateTime<Utc>,
    ) -> ReconcileReport {
        // Later duplicates overwrite earlier ones.
        let mut rows: IndexMap<String, &DeviceRow> = IndexMap::with_capacity(table.len());
        for row in table {
            let ip = normalize_ip(&row.ip_address);
            if !ip.is_empty() {
                rows.insert(ip, row);
            }
        }

        let mut report = ReconcileReport::default();
        let known = self.store.entities.keys();

        // ── Known entities ───────────────────────────────────────────
        for ip in known {
            let Some(current) = self.store.entities.get_by_key(&ip) else {
                continue;
            };
            let mut entity = PresenceEntity::clone(&current);
            let was_connected = entity.is_connected;

            if let Some(row) = rows.get(&ip) {
                observe(&mut entity, row, now);
                if entity.is_connected != was_connected {
                    info!(ip = %ip, connected = entity.is_connected, "presence changed");
                    report.updated.push(ip.clone());
                }
            } else {
                entity.is_connected = false;
                if was_connected {
                    info!(ip = %ip, "device left the host table");
                    report.went_offline.push(ip.clone());
                }
            }

            entity.name_override = name_for(&entity, filters);
            self.sink.update(&entity);
            self.store.entities.upsert_silent(ip, None, entity);
        }

        // ── Discovery ────────────────────────────────────────────────
        for (ip, row) in &rows {
            if self.store.entities.contains(ip) || self.skipped.contains(ip) {
                continue;
            }

            let mac = MacAddress::parse_opt(row.mac_address.as_deref());
            let mac_str = mac.as_ref().map(MacAddress::as_str);
            if is_disabled(ip, mac_str, &filters.disabled_ips, &filters.disabled_macs) {
                info!(ip = %ip, mac = ?mac_str, "device disabled, not tracking");
                self.skipped.insert(ip.clone());
                continue;
            }

            let mut entity = PresenceEntity {
                mac,
                ..PresenceEntity::new(ip.clone())
            };
            observe(&mut entity, row, now);
            entity.name_override = name_for(&entity, filters);

            info!(
                ip = %ip,
                name = %entity.display_name(),
                connected = entity.is_connected,
                "new device"
            );
            self.sink.create(&entity);

            let secondary = entity.mac.as_ref().map(|mac| mac.as_str().to_owned());
            self.store
                .entities
                .upsert_silent(ip.clone(), secondary, entity);
            report.created.push(ip.clone());
        }

        self.store.entities.flush();
        report.sort();

        debug!(
            rows = rows.len(),
            entities = self.store.entity_count(),
            created = report.created.len(),
            updated = report.updated.len(),
            went_offline = report.went_offline.len(),
            "reconciled host table"
        );
        report
    }
}

/// Copy a present row's mutable fields onto its entity as one unit.
fn observe(entity: &mut PresenceEntity, row: &DeviceRow, now: DateTime<Utc>) {
    if let Some(hostname) = row.hostname.as_deref().filter(|h| !h.is_empty()) {
        entity.hostname = Some(hostname.to_owned());
    }
    entity.active_raw = row.active_raw.clone();
    entity.status_raw = row.status_raw.clone();
    entity.is_connected = decide(row);
    entity.last_seen = Some(now);
}

fn name_for(entity: &PresenceEntity, filters: &FilterConfig) -> Option<String> {
    resolve_name(
        &entity.ip,
        entity.mac.as_ref().map(MacAddress::as_str),
        &filters.name_overrides_by_ip,
        &filters.name_overrides_by_mac,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        created: Mutex<Vec<String>>,
        updated: Mutex<Vec<String>>,
    }

    impl PresenceSink for RecordingSink {
        fn create(&self, entity: &PresenceEntity) {
            self.created.lock().unwrap().push(entity.ip.clone());
        }

        fn update(&self, entity: &PresenceEntity) {
            self.updated.lock().unwrap().push(entity.ip.clone());
        }

        fn mark_unavailable(&self, _error: &CoreError) {}
    }

    fn setup() -> (Reconciler, Arc<PresenceStore>, Arc<RecordingSink>) {
        let store = Arc::new(PresenceStore::new());
        let sink = Arc::new(RecordingSink::default());
        let reconciler = Reconciler::new(Arc::clone(&store), sink.clone());
        (reconciler, store, sink)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn phone() -> DeviceRow {
        DeviceRow::new("10.0.0.5")
            .with_mac("AA-BB-CC-DD-EE-FF")
            .with_hostname("phone")
            .with_active("on")
    }

    #[test]
    fn first_sighting_creates_entity() {
        let (mut rec, store, sink) = setup();

        let report = rec.apply_at(&[phone()], &FilterConfig::default(), at(0));

        assert_eq!(report.created, vec!["10.0.0.5"]);
        let entity = store.entity("10.0.0.5").unwrap();
        assert_eq!(entity.mac.as_ref().unwrap().as_str(), "aa:bb:cc:dd:ee:ff");
        assert!(entity.is_connected);
        assert_eq!(entity.last_seen, Some(at(0)));
        assert_eq!(*sink.created.lock().unwrap(), vec!["10.0.0.5"]);
        assert_eq!(store.entities_snapshot().len(), 1);
    }

    #[test]
    fn vanished_device_goes_offline_exactly_once() {
        let (mut rec, store, _sink) = setup();
        let filters = FilterConfig::default();
        rec.apply_at(&[phone()], &filters, at(0));

        let report = rec.apply_at(&[], &filters, at(60));
        assert_eq!(report.went_offline, vec!["10.0.0.5"]);
        let entity = store.entity("10.0.0.5").unwrap();
        assert!(!entity.is_connected);
        assert_eq!(entity.hostname.as_deref(), Some("phone"));
        assert_eq!(entity.mac.as_ref().unwrap().as_str(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(entity.last_seen, Some(at(0)));

        let report = rec.apply_at(&[], &filters, at(120));
        assert!(report.is_empty());
        assert_eq!(store.entity_count(), 1);
    }

    #[test]
    fn flips_while_present_are_reported_as_updates() {
        let (mut rec, store, _sink) = setup();
        let filters = FilterConfig::default();
        rec.apply_at(&[phone()], &filters, at(0));

        let report = rec.apply_at(&[phone().with_active("off")], &filters, at(60));
        assert_eq!(report.updated, vec!["10.0.0.5"]);
        assert!(report.went_offline.is_empty());
        assert_eq!(store.entity("10.0.0.5").unwrap().last_seen, Some(at(60)));

        let report = rec.apply_at(&[phone().with_active("off")], &filters, at(120));
        assert!(report.updated.is_empty());
    }

    #[test]
    fn already_offline_device_leaving_is_not_reported() {
        let (mut rec, store, _sink) = setup();
        let filters = FilterConfig::default();
        let report = rec.apply_at(&[phone().with_active("off")], &filters, at(0));
        assert_eq!(report.created, vec!["10.0.0.5"]);
        assert!(!store.entity("10.0.0.5").unwrap().is_connected);

        let report = rec.apply_at(&[], &filters, at(60));
        assert!(report.went_offline.is_empty());
        assert!(report.is_empty());
        let entity = store.entity("10.0.0.5").unwrap();
        assert!(!entity.is_connected);
        assert_eq!(entity.last_seen, Some(at(0)));
    }

    #[test]
    fn disabled_devices_never_get_entities() {
        let (mut rec, store, sink) = setup();
        let filters = FilterConfig::default().disable_ips(["10.0.0.5"]);

        for tick in 0..3 {
            let report = rec.apply_at(&[phone()], &filters, at(tick));
            assert!(report.created.is_empty());
        }
        assert_eq!(store.entity_count(), 0);
        assert!(sink.created.lock().unwrap().is_empty());
        assert_eq!(rec.skipped(), vec!["10.0.0.5"]);
    }

    #[test]
    fn legacy_mac_filter_applies_at_discovery() {
        let (mut rec, store, _sink) = setup();
        let filters = FilterConfig::default().disable_macs(["aa:bb:cc:dd:ee:ff"]);
        rec.apply_at(&[phone()], &filters, at(0));
        assert!(store.entity("10.0.0.5").is_none());
    }

    #[test]
    fn filtering_is_sticky() {
        let (mut rec, store, _sink) = setup();

        rec.apply_at(&[phone()], &FilterConfig::default().disable_ips(["10.0.0.5"]), at(0));
        rec.apply_at(&[phone()], &FilterConfig::default(), at(60));
        assert!(store.entity("10.0.0.5").is_none());

        let other = DeviceRow::new("10.0.0.6").with_active(true);
        rec.apply_at(&[other.clone()], &FilterConfig::default(), at(0));
        rec.apply_at(&[other], &FilterConfig::default().disable_ips(["10.0.0.6"]), at(60));
        assert!(store.entity("10.0.0.6").is_some());
    }

    #[test]
    fn name_precedence_with_every_source_present() {
        let (mut rec, store, _sink) = setup();
        let both = FilterConfig::default()
            .name_ip("10.0.0.5", "Desk")
            .name_mac("aa:bb:cc:dd:ee:ff", "Alice's Phone");

        rec.apply_at(&[phone()], &both, at(0));
        assert_eq!(store.entity("10.0.0.5").unwrap().display_name(), "Desk Network Presence");

        let mac_only = FilterConfig::default().name_mac("aa:bb:cc:dd:ee:ff", "Alice's Phone");
        rec.apply_at(&[phone()], &mac_only, at(60));
        assert_eq!(
            store.entity("10.0.0.5").unwrap().display_name(),
            "Alice's Phone Network Presence"
        );

        rec.apply_at(&[phone()], &FilterConfig::default(), at(120));
        assert_eq!(store.entity("10.0.0.5").unwrap().display_name(), "phone Network Presence");

        let bare = DeviceRow::new("10.0.0.7");
        rec.apply_at(&[bare], &FilterConfig::default(), at(180));
        assert_eq!(
            store.entity("10.0.0.7").unwrap().display_name(),
            "10.0.0.7 Network Presence"
        );
    }

    #[test]
    fn hostname_keeps_last_known_value() {
        let (mut rec, store, _sink) = setup();
        let filters = FilterConfig::default();
        rec.apply_at(&[phone()], &filters, at(0));

        let mut nameless = phone();
        nameless.hostname = None;
        rec.apply_at(&[nameless], &filters, at(60));
        assert_eq!(store.entity("10.0.0.5").unwrap().hostname.as_deref(), Some("phone"));

        rec.apply_at(&[phone().with_hostname("phone-2")], &filters, at(120));
        assert_eq!(store.entity("10.0.0.5").unwrap().hostname.as_deref(), Some("phone-2"));
    }

    #[test]
    fn duplicate_rows_last_one_wins() {
        let (mut rec, store, _sink) = setup();
        let rows = [phone(), phone().with_active("off")];
        let report = rec.apply_at(&rows, &FilterConfig::default(), at(0));
        assert_eq!(report.created, vec!["10.0.0.5"]);
        assert!(!store.entity("10.0.0.5").unwrap().is_connected);
    }

    #[test]
    fn mac_is_fixed_at_discovery() {
        let (mut rec, store, _sink) = setup();
        let filters = FilterConfig::default();
        rec.apply_at(&[phone()], &filters, at(0));
        rec.apply_at(&[phone().with_mac("11:22:33:44:55:66")], &filters, at(60));

        let entity = store.entity_by_mac("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(entity.ip, "10.0.0.5");
        assert!(store.entity_by_mac("11:22:33:44:55:66").is_none());
    }

    #[test]
    fn every_known_entity_is_written_each_poll() {
        let (mut rec, _store, sink) = setup();
        let filters = FilterConfig::default();
        let rows = [phone(), DeviceRow::new("10.0.0.9").with_status("ONLINE")];
        rec.apply_at(&rows, &filters, at(0));
        assert!(sink.updated.lock().unwrap().is_empty());

        rec.apply_at(&rows[..1], &filters, at(60));
        let mut updated = sink.updated.lock().unwrap().clone();
        updated.sort();
        assert_eq!(updated, vec!["10.0.0.5", "10.0.0.9"]);
    }

    #[test]
    fn report_lists_are_sorted_numerically() {
        let (mut rec, _store, _sink) = setup();
        let rows: Vec<_> = ["10.0.0.10", "10.0.0.2", "10.0.0.1"]
            .into_iter()
            .map(DeviceRow::new)
            .collect();
        let report = rec.apply_at(&rows, &FilterConfig::default(), at(0));
        assert_eq!(report.created, vec!["10.0.0.1", "10.0.0.2", "10.0.0.10"]);
    }
}
