// ── Identifier normalization, filtering and naming ──
//
// Pure functions shared by the reconciler and the options parser. Every
// lookup key (disable lists, name overrides) goes through the same
// normalizers so user-entered text and router rows compare equal.

use std::collections::{BTreeMap, BTreeSet};

// ── Normalization ────────────────────────────────────────────────────

/// Canonical MAC form: lowercase, colon-separated, two-digit octets.
///
/// Dashes count as separators and empty segments are dropped, so
/// `"AA-BB-C-DD-EE-FF"` becomes `"aa:bb:0c:dd:ee:ff"`. Idempotent.
pub fn normalize_mac(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace('-', ":");
    lowered
        .split(':')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("{segment:0>2}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Canonical IP form. Router-supplied values are trusted, so this only trims.
pub fn normalize_ip(raw: &str) -> String {
    raw.trim().to_owned()
}

// ── Filtering ────────────────────────────────────────────────────────

/// Whether a device is excluded from presence tracking.
///
/// True if the IP is on `disabled_ips` or the MAC (when known) is on the
/// legacy `disabled_macs` list.
pub fn is_disabled(
    ip: &str,
    mac: Option<&str>,
    disabled_ips: &BTreeSet<String>,
    disabled_macs: &BTreeSet<String>,
) -> bool {
    if disabled_ips.contains(&normalize_ip(ip)) {
        return true;
    }
    mac.map(normalize_mac)
        .is_some_and(|mac| !mac.is_empty() && disabled_macs.contains(&mac))
}

// ── Naming ───────────────────────────────────────────────────────────

/// Resolve a user-supplied display name for a device.
///
/// An IP-keyed override wins; otherwise the MAC-keyed override applies when
/// the MAC is known. `None` means the caller falls back to hostname, then IP.
pub fn resolve_name(
    ip: &str,
    mac: Option<&str>,
    overrides_ip: &BTreeMap<String, String>,
    overrides_mac: &BTreeMap<String, String>,
) -> Option<String> {
    let by_ip = overrides_ip
        .get(&normalize_ip(ip))
        .filter(|name| !name.is_empty());
    let by_mac = || {
        mac.map(normalize_mac)
            .and_then(|mac| overrides_mac.get(&mac))
            .filter(|name| !name.is_empty())
    };
    by_ip.or_else(by_mac).cloned()
}

// ── Options text ─────────────────────────────────────────────────────

/// Parse a comma/newline separated list of IPs into a sorted, de-duplicated list.
pub fn parse_disabled_ips(text: &str) -> Vec<String> {
    parse_list(text, normalize_ip)
}

/// Parse a comma/newline separated list of MACs into a sorted, de-duplicated list.
pub fn parse_disabled_macs(text: &str) -> Vec<String> {
    parse_list(text, normalize_mac)
}

/// Parse `ip = name` lines.
pub fn parse_name_overrides_ip(text: &str) -> BTreeMap<String, String> {
    parse_mapping(text, normalize_ip)
}

/// Parse `mac = name` lines. Keys are normalized MACs.
pub fn parse_name_overrides_mac(text: &str) -> BTreeMap<String, String> {
    parse_mapping(text, normalize_mac)
}

/// Render a list the way the options form shows it: `"a, b, c"`.
pub fn format_list_text<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a mapping as `key = value` lines.
pub fn format_mapping_text(mapping: &BTreeMap<String, String>) -> String {
    mapping
        .iter()
        .map(|(key, name)| format!("{key} = {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_list(text: &str, normalize: fn(&str) -> String) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(normalize)
        .filter(|token| !token.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Each line splits on its first `=`, or failing that its first `:`.
/// Lines with neither separator, or with an empty key or name, are skipped.
fn parse_mapping(text: &str, normalize: fn(&str) -> String) -> BTreeMap<String, String> {
    let mut mapping = BTreeMap::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, name)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let key = normalize(key);
        let name = name.trim();
        if !key.is_empty() && !name.is_empty() {
            mapping.insert(key, name.to_owned());
        }
    }
    mapping
}
