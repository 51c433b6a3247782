// Router API response types
//
// Every endpoint answers with the same envelope. Host table fields are
// optional because firmware revisions disagree about which keys exist
// and how they are cased.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard router API response envelope.
///
/// ```json
/// { "error": "ok", "message": "all values retrieved", "data": { ... } }
/// ```
#[derive(Debug, Deserialize)]
pub struct RouterResponse<T> {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> RouterResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.error.eq_ignore_ascii_case("ok")
    }
}

// ── Host table ───────────────────────────────────────────────────────

/// Payload of `GET /api/v1/host/hostTbl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostTable {
    #[serde(rename = "hostTbl", default, deserialize_with = "lenient_rows")]
    pub hosts: Vec<HostEntry>,
}

/// One row of the router's host table.
///
/// Only the identity fields are modelled explicitly; presence flags are
/// read from `extra` because the router reports them under differently
/// cased keys (`active`/`Active`, `Status`/`status`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub ipaddress: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub physaddress: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hostname: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HostEntry {
    /// Raw `active` flag, falling back to `Active`. JSON `null` counts as absent.
    pub fn active(&self) -> Option<&Value> {
        self.non_null("active").or_else(|| self.non_null("Active"))
    }

    /// Raw status string, preferring `Status` over `status`.
    ///
    /// Non-string values are rendered as JSON text.
    pub fn status(&self) -> Option<String> {
        self.non_null("Status")
            .or_else(|| self.non_null("status"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }

    fn non_null(&self, key: &str) -> Option<&Value> {
        self.extra.get(key).filter(|v| !v.is_null())
    }
}

// ── Lenient decoding ─────────────────────────────────────────────────
//
// One garbled row must not cost the whole table. Non-string identity
// fields read as absent and non-object rows are skipped.

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_rows<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<HostEntry>, D::Error> {
    let rows = match Value::deserialize(deserializer)? {
        Value::Array(rows) => rows,
        _ => return Ok(Vec::new()),
    };
    Ok(rows
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect())
}
