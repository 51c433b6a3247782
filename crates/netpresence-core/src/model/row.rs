// ── Host table rows ──

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One host table row as seen by the reconciler.
///
/// Produced fresh on every poll and never stored. Only `ip_address` is
/// required; the presence fields keep whatever the router sent so the
/// decision rules can interpret them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRow {
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub hostname: Option<String>,
    /// `active` (or `Active`) exactly as reported.
    pub active_raw: Option<Value>,
    /// `Status` (or `status`) as text.
    pub status_raw: Option<String>,
}

impl DeviceRow {
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn with_active(mut self, active: impl Into<Value>) -> Self {
        self.active_raw = Some(active.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status_raw = Some(status.into());
        self
    }
}
