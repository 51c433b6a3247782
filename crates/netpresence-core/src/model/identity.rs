// ── Device identity ──
//
// The normalized IP is the primary key for presence entities. MAC is a
// secondary key used for legacy filters and name overrides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::filter::normalize_mac;

/// MAC address in canonical form (`aa:bb:cc:dd:ee:ff`).
///
/// Accepts colon- or dash-separated input in any case; octets are
/// zero-padded to two digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize_mac(raw.as_ref()))
    }

    /// Normalize and return `None` when nothing is left.
    pub fn parse_opt(raw: Option<&str>) -> Option<Self> {
        raw.map(Self::new).filter(|mac| !mac.0.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Sort key that orders dotted/colon IPs numerically.
///
/// Unparseable values sort after every valid address and then by text.
pub fn ip_sort_key(ip: &str) -> (u8, Option<std::net::IpAddr>, String) {
    match ip.trim().parse::<std::net::IpAddr>() {
        Ok(addr) => (0, Some(addr), String::new()),
        Err(_) => (1, None, ip.to_owned()),
    }
}
