// ── API-to-domain conversions ──
//
// Turns raw host table entries into `DeviceRow`s. Rows without a usable
// IP are dropped here, so the reconciler never sees them.

use netpresence_api::HostEntry;

use crate::filter::normalize_ip;
use crate::model::DeviceRow;

/// Convert one host table entry. `None` when the IP is missing or blank.
pub fn device_row(entry: &HostEntry) -> Option<DeviceRow> {
    let ip = entry.ipaddress.as_deref().map(normalize_ip)?;
    if ip.is_empty() {
        return None;
    }
    Some(DeviceRow {
        ip_address: ip,
        mac_address: entry.physaddress.clone(),
        hostname: entry.hostname.clone(),
        active_raw: entry.active().cloned(),
        status_raw: entry.status(),
    })
}

/// Convert a whole host table, silently dropping unusable rows.
pub fn device_rows(entries: &[HostEntry]) -> Vec<DeviceRow> {
    entries.iter().filter_map(device_row).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> HostEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_fields_and_case_variants() {
        let row = device_row(&entry(json!({
            "ipaddress": " 10.0.0.5 ",
            "physaddress": "AA-BB-CC-DD-EE-FF",
            "hostname": "phone",
            "Active": "on",
            "status": "ONLINE"
        })))
        .unwrap();

        assert_eq!(row.ip_address, "10.0.0.5");
        assert_eq!(row.mac_address.as_deref(), Some("AA-BB-CC-DD-EE-FF"));
        assert_eq!(row.active_raw, Some(json!("on")));
        assert_eq!(row.status_raw.as_deref(), Some("ONLINE"));
    }

    #[test]
    fn drops_rows_without_ip() {
        let rows = device_rows(&[
            entry(json!({ "physaddress": "aa:bb:cc:dd:ee:ff" })),
            entry(json!({ "ipaddress": "   " })),
            entry(json!({ "ipaddress": 17, "hostname": false })),
            entry(json!({ "ipaddress": "10.0.0.9" })),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ip_address, "10.0.0.9");
    }
}
