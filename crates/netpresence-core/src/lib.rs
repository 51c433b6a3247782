//! Presence reconciliation between a router's host table and long-lived
//! device entities.
//!
//! - **[`Monitor`]** owns one router: it runs an eager first poll, spawns the
//!   periodic refresh, serializes polls, and exposes read-only snapshots.
//!
//! - **[`Reconciler`]** merges each fetched table into the [`PresenceStore`]:
//!   creates entities for new IPs, refreshes known ones, flips vanished ones
//!   offline. Entities are never removed.
//!
//! - **[`presence`]** decides online/offline from inconsistent firmware
//!   fields; **[`filter`]** normalizes MACs and IPs, applies disable lists and
//!   resolves name overrides.
//!
//! - **[`HostTableSource`]** and **[`PresenceSink`]** are the seams to the
//!   router and to whatever consumes entity changes. [`RouterSource`] is the
//!   production source built on `netpresence-api`.

pub mod config;
pub mod convert;
pub mod error;
pub mod filter;
pub mod model;
pub mod monitor;
pub mod presence;
pub mod reconcile;
pub mod sink;
pub mod source;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    DEFAULT_SCAN_INTERVAL_SECS, FilterConfig, MIN_SCAN_INTERVAL_SECS, MonitorConfig, RouterConfig,
    TlsVerification, clamp_scan_interval,
};
pub use error::CoreError;
pub use model::{
    DeviceRow, EntityAttributes, MacAddress, PRESENCE_LABEL, PresenceEntity, PresenceState,
    RouterDevice,
};
pub use monitor::Monitor;
pub use presence::decide;
pub use reconcile::{ReconcileReport, Reconciler};
pub use sink::{NullSink, PresenceSink};
pub use source::{HostTableSource, RouterSource};
pub use store::PresenceStore;
