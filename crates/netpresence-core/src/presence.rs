// ── Presence decision ──
//
// Firmware reports presence either through an `active` flag or a
// `Status` string, with inconsistent types and casing. Nothing here can
// fail: anything ambiguous is treated as offline.

use serde_json::Value;

use crate::model::DeviceRow;

const TRUE_WORDS: [&str; 4] = ["true", "1", "yes", "on"];
const FALSE_WORDS: [&str; 6] = ["false", "0", "no", "off", "none", ""];

/// Coerce a raw flag to a tri-state boolean.
///
/// Booleans pass through. Strings are trimmed and lowercased before being
/// matched against the known words; numbers are matched by their decimal
/// text. Everything else, including `null`, is unknown.
pub fn coerce_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => coerce_word(text),
        Value::Number(number) => coerce_word(&number.to_string()),
        _ => None,
    }
}

fn coerce_word(text: &str) -> Option<bool> {
    let word = text.trim().to_lowercase();
    if TRUE_WORDS.contains(&word.as_str()) {
        Some(true)
    } else if FALSE_WORDS.contains(&word.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Interpret a status string. `ONLINE` is matched upper-cased and
/// `offline` lower-cased; any other value is unknown.
pub fn status_flag(status: &str) -> Option<bool> {
    if status.to_uppercase() == "ONLINE" {
        Some(true)
    } else if status.to_lowercase() == "offline" {
        Some(false)
    } else {
        None
    }
}

/// Decide whether a row's device is currently connected.
///
/// A definite `active` flag wins. Otherwise the status string decides,
/// and if that is unknown too the device counts as offline.
pub fn decide(row: &DeviceRow) -> bool {
    if let Some(flag) = row.active_raw.as_ref().and_then(coerce_flag) {
        return flag;
    }
    row.status_raw
        .as_deref()
        .and_then(status_flag)
        .unwrap_or(false)
}
