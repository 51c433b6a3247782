// ── Presence entity domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use super::identity::MacAddress;

/// Fixed suffix appended to every display name.
pub const PRESENCE_LABEL: &str = "Network Presence";

/// Tracker source reported with every entity.
pub const SOURCE_TYPE: &str = "router";

const MANUFACTURER: &str = "Technicolor";

/// Presence state exposed to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PresenceState {
    Home,
    NotHome,
}

impl From<bool> for PresenceState {
    fn from(connected: bool) -> Self {
        if connected { Self::Home } else { Self::NotHome }
    }
}

/// Long-lived presence record for one device, keyed by its normalized IP.
///
/// Created on first sighting and never removed. A device that drops out
/// of the host table stays here with `is_connected = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEntity {
    pub ip: String,
    /// Fixed at discovery.
    pub mac: Option<MacAddress>,
    /// Last hostname the router reported.
    pub hostname: Option<String>,
    /// User override resolved from the current filter config.
    pub name_override: Option<String>,
    pub is_connected: bool,
    pub status_raw: Option<String>,
    pub active_raw: Option<Value>,
    /// Time of the last poll that contained this device.
    pub last_seen: Option<DateTime<Utc>>,
}

impl PresenceEntity {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            mac: None,
            hostname: None,
            name_override: None,
            is_connected: false,
            status_raw: None,
            active_raw: None,
            last_seen: None,
        }
    }

    /// Override, then hostname, then IP. Empty strings count as missing.
    pub fn base_name(&self) -> &str {
        self.name_override
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.hostname.as_deref().filter(|name| !name.is_empty()))
            .unwrap_or(&self.ip)
    }

    /// `"<name> Network Presence"`.
    pub fn display_name(&self) -> String {
        format!("{} {PRESENCE_LABEL}", self.base_name())
    }

    /// Stable platform identifier, `"{scope}_tracker_ip_{ip}"`.
    ///
    /// `:` and `/` in the IP become `_` so IPv6 and CIDR-ish values stay
    /// usable as identifiers.
    pub fn unique_id(&self, scope: &str) -> String {
        let safe_ip = self.ip.replace([':', '/'], "_");
        format!("{scope}_tracker_ip_{safe_ip}")
    }

    pub fn state(&self) -> PresenceState {
        PresenceState::from(self.is_connected)
    }

    pub fn source_type(&self) -> &'static str {
        SOURCE_TYPE
    }

    pub fn attributes(&self) -> EntityAttributes {
        EntityAttributes {
            mac: self.mac.as_ref().map(|mac| mac.as_str().to_owned()),
            ip: self.ip.clone(),
            hostname: self.hostname.clone(),
            status_raw: self.status_raw.clone(),
            active_raw: self.active_raw.clone(),
            last_seen: self.last_seen.map(|ts| ts.to_rfc3339()),
            source: SOURCE_TYPE,
        }
    }
}

/// Extra state attributes published alongside each entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityAttributes {
    pub mac: Option<String>,
    pub ip: String,
    pub hostname: Option<String>,
    pub status_raw: Option<String>,
    pub active_raw: Option<Value>,
    pub last_seen: Option<String>,
    pub source: &'static str,
}

/// The router all presence entities hang off in the platform's device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterDevice {
    pub identifiers: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub configuration_url: String,
}

impl RouterDevice {
    pub fn new(host: &str) -> Self {
        Self {
            identifiers: host.to_owned(),
            name: format!("Router {host}"),
            manufacturer: MANUFACTURER,
            configuration_url: format!("http://{host}/"),
        }
    }
}
