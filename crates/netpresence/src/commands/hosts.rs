//! `hosts`: one login, one host table fetch, printed as a table.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use netpresence_core::model::ip_sort_key;
use netpresence_core::{DeviceRow, HostTableSource, RouterSource, decide};

use crate::cli::{GlobalOpts, HostsArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── View model ──────────────────────────────────────────────────────

/// One host table row as printed.
#[derive(Debug, Serialize)]
struct HostView {
    ip: String,
    mac: Option<String>,
    hostname: Option<String>,
    active: Option<Value>,
    status: Option<String>,
    online: bool,
}

impl From<&DeviceRow> for HostView {
    fn from(row: &DeviceRow) -> Self {
        Self {
            ip: row.ip_address.clone(),
            mac: row.mac_address.clone(),
            hostname: row.hostname.clone(),
            active: row.active_raw.clone(),
            status: row.status_raw.clone(),
            online: decide(row),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn to_row(host: &HostView, color: bool) -> HostRow {
    let active = match host.active {
        Some(Value::String(ref s)) => s.clone(),
        Some(ref other) => other.to_string(),
        None => "-".into(),
    };
    HostRow {
        mac: host.mac.clone().unwrap_or_else(|| "-".into()),
        ip: host.ip.clone(),
        hostname: host.hostname.clone().unwrap_or_else(|| "-".into()),
        active,
        status: output::paint_state(
            host.status.as_deref().unwrap_or("-"),
            host.online,
            color,
        ),
    }
}

/// Numeric IP order, then hostname. Unparseable IPs go last.
fn sort_hosts(hosts: &mut [HostView]) {
    hosts.sort_by(|a, b| {
        ip_sort_key(&a.ip)
            .cmp(&ip_sort_key(&b.ip))
            .then_with(|| a.hostname.cmp(&b.hostname))
    });
}

fn totals_line(hosts: &[HostView]) -> String {
    let online = hosts.iter().filter(|h| h.online).count();
    format!(
        "Total devices: {} — Online: {} — Offline: {}",
        hosts.len(),
        online,
        hosts.len() - online
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    source: &RouterSource,
    args: &HostsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let fetched = source.fetch_host_table().await;
    source.close().await;
    let rows = fetched?;

    let mut hosts: Vec<HostView> = rows.iter().map(HostView::from).collect();
    sort_hosts(&mut hosts);
    let totals = totals_line(&hosts);
    if args.online {
        hosts.retain(|h| h.online);
    }

    let color = output::should_color(&global.color);
    let mut rendered =
        output::render_list(&global.output, &hosts, |h| to_row(h, color), |h| h.ip.clone())?;
    if matches!(global.output, OutputFormat::Table) {
        rendered.push('\n');
        rendered.push_str(&totals);
    }
    output::print_output(&rendered, global.quiet);
    Ok(())
}
