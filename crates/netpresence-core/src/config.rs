// ── Runtime configuration ──
//
// These types describe how to reach the router and how to filter and name
// what it reports. They never touch disk: netpresence-config builds them
// from a profile and hands them in.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::filter::{normalize_ip, normalize_mac};

/// Poll interval used when a profile does not set one.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

/// Shortest poll interval the scheduler accepts.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 10;

/// Clamp a user-supplied interval to the supported minimum.
pub fn clamp_scan_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.max(MIN_SCAN_INTERVAL_SECS))
}

// ── Router connection ────────────────────────────────────────────────

/// TLS verification strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    SystemDefaults,
    /// Skip verification. Router web UIs rarely carry a valid certificate.
    #[default]
    DangerAcceptInvalid,
}

/// How to reach and authenticate against the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Router root URL, e.g. `http://192.168.0.1/`.
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

// ── Filtering and naming ─────────────────────────────────────────────

/// Disable lists, name overrides and poll interval for one router.
///
/// All keys are stored normalized; use the builder methods or
/// [`FilterConfig::normalized`] rather than filling the sets directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub disabled_ips: BTreeSet<String>,
    /// Legacy MAC-based disable list.
    pub disabled_macs: BTreeSet<String>,
    pub name_overrides_by_ip: BTreeMap<String, String>,
    /// Legacy MAC-keyed overrides, consulted after the IP-keyed ones.
    pub name_overrides_by_mac: BTreeMap<String, String>,
    pub poll_interval: Duration,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            disabled_ips: BTreeSet::new(),
            disabled_macs: BTreeSet::new(),
            name_overrides_by_ip: BTreeMap::new(),
            name_overrides_by_mac: BTreeMap::new(),
            poll_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
        }
    }
}

impl FilterConfig {
    pub fn disable_ips<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disabled_ips.extend(
            ips.into_iter()
                .map(|ip| normalize_ip(ip.as_ref()))
                .filter(|ip| !ip.is_empty()),
        );
        self
    }

    pub fn disable_macs<I, S>(mut self, macs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disabled_macs.extend(
            macs.into_iter()
                .map(|mac| normalize_mac(mac.as_ref()))
                .filter(|mac| !mac.is_empty()),
        );
        self
    }

    pub fn name_ip(mut self, ip: &str, name: impl Into<String>) -> Self {
        self.name_overrides_by_ip.insert(normalize_ip(ip), name.into());
        self
    }

    pub fn name_mac(mut self, mac: &str, name: impl Into<String>) -> Self {
        self.name_overrides_by_mac
            .insert(normalize_mac(mac), name.into());
        self
    }

    /// Set the poll interval in seconds, clamped to the minimum.
    pub fn scan_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval = clamp_scan_interval(secs);
        self
    }

    /// Re-normalize every key, e.g. after deserializing hand-written values.
    #[must_use]
    pub fn normalized(self) -> Self {
        let poll_interval = self
            .poll_interval
            .max(Duration::from_secs(MIN_SCAN_INTERVAL_SECS));
        let mut out = Self {
            poll_interval,
            ..Self::default()
        }
        .disable_ips(&self.disabled_ips)
        .disable_macs(&self.disabled_macs);
        for (ip, name) in self.name_overrides_by_ip {
            out = out.name_ip(&ip, name);
        }
        for (mac, name) in self.name_overrides_by_mac {
            out = out.name_mac(&mac, name);
        }
        out
    }
}

// ── Monitor ──────────────────────────────────────────────────────────

/// Settings for one [`Monitor`](crate::Monitor).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Namespace for entity unique ids (the profile name).
    pub scope: String,
    /// Router host, used for the device registry entry.
    pub router_host: String,
    pub filters: FilterConfig,
}

impl MonitorConfig {
    pub fn new(scope: impl Into<String>, router_host: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            router_host: router_host.into(),
            filters: FilterConfig::default(),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: FilterConfig) -> Self {
        self.filters = filters;
        self
    }
}
