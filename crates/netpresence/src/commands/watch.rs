//! `watch`: run the presence monitor and print state changes.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use netpresence_core::config::clamp_scan_interval;
use netpresence_core::{
    CoreError, Monitor, PresenceEntity, PresenceSink, PresenceState, RouterSource,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

// ── Event sink ──────────────────────────────────────────────────────

/// Prints discoveries and home/not_home transitions as they happen.
struct ConsoleSink {
    scope: String,
    color: bool,
    quiet: bool,
    last_state: Mutex<HashMap<String, PresenceState>>,
    unavailable: Mutex<bool>,
}

impl ConsoleSink {
    fn new(scope: String, color: bool, quiet: bool) -> Self {
        Self {
            scope,
            color,
            quiet,
            last_state: Mutex::new(HashMap::new()),
            unavailable: Mutex::new(false),
        }
    }

    fn emit(&self, line: &str) {
        if self.quiet {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
    }

    fn line(&self, verb: &str, entity: &PresenceEntity) -> String {
        let state = entity.state();
        format!(
            "{} {verb:<8} {:<15} {} ({})",
            chrono::Local::now().format("%H:%M:%S"),
            entity.ip,
            entity.display_name(),
            output::paint_state(&state.to_string(), entity.is_connected, self.color),
        )
    }

    /// Record `state` and return the previous one.
    fn remember(&self, entity: &PresenceEntity) -> Option<PresenceState> {
        let mut states = self
            .last_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        states.insert(entity.ip.clone(), entity.state())
    }

    fn recovered(&self) {
        let mut unavailable = self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *unavailable {
            *unavailable = false;
            info!("router reachable again");
            self.emit("router reachable again");
        }
    }
}

impl PresenceSink for ConsoleSink {
    fn create(&self, entity: &PresenceEntity) {
        self.recovered();
        self.remember(entity);
        info!(
            entity_id = %entity.unique_id(&self.scope),
            ip = %entity.ip,
            state = %entity.state(),
            "device discovered"
        );
        self.emit(&self.line("new", entity));
    }

    fn update(&self, entity: &PresenceEntity) {
        self.recovered();
        let previous = self.remember(entity);
        if previous.is_some_and(|prev| prev != entity.state()) {
            info!(ip = %entity.ip, state = %entity.state(), "presence changed");
            self.emit(&self.line("changed", entity));
        }
    }

    fn mark_unavailable(&self, error: &CoreError) {
        let mut unavailable = self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*unavailable {
            *unavailable = true;
            warn!(error = %error, "router unavailable, entity state is stale");
            self.emit(&format!("router unavailable: {error}"));
        }
    }
}

// ── Entity view ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EntityView {
    unique_id: String,
    name: String,
    ip: String,
    mac: Option<String>,
    hostname: Option<String>,
    state: PresenceState,
    source_type: &'static str,
    last_seen: Option<String>,
}

impl EntityView {
    fn new(entity: &PresenceEntity, scope: &str) -> Self {
        let attributes = entity.attributes();
        Self {
            unique_id: entity.unique_id(scope),
            name: entity.display_name(),
            ip: attributes.ip,
            mac: attributes.mac,
            hostname: attributes.hostname,
            state: entity.state(),
            source_type: entity.source_type(),
            last_seen: attributes.last_seen,
        }
    }
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

fn to_row(view: &EntityView, color: bool) -> EntityRow {
    EntityRow {
        name: view.name.clone(),
        ip: view.ip.clone(),
        mac: view.mac.clone().unwrap_or_else(|| "-".into()),
        state: output::paint_state(
            &view.state.to_string(),
            view.state == PresenceState::Home,
            color,
        ),
        last_seen: view.last_seen.clone().unwrap_or_else(|| "-".into()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    resolved: Resolved,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut monitor_config = resolved.monitor;
    if let Some(secs) = args.interval {
        monitor_config.filters.poll_interval = clamp_scan_interval(secs);
    }
    let scope = monitor_config.scope.clone();
    let color = output::should_color(&global.color);

    let source = Arc::new(RouterSource::new(&resolved.router)?);
    // --once prints the final table instead of a running log.
    let quiet_events = global.quiet || args.once;
    let sink = Arc::new(ConsoleSink::new(scope.clone(), color, quiet_events));
    let monitor = Monitor::new(monitor_config, source, sink);

    if args.once {
        let result = monitor.refresh().await;
        monitor.shutdown().await;
        result?;

        let views: Vec<EntityView> = monitor
            .store()
            .sorted_entities()
            .iter()
            .map(|entity| EntityView::new(entity, &scope))
            .collect();
        let out = output::render_list(
            &global.output,
            &views,
            |view| to_row(view, color),
            |view| view.unique_id.clone(),
        )?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    if let Err(err) = monitor.start().await {
        monitor.shutdown().await;
        return Err(err.into());
    }
    info!(
        router = %monitor.router_device().name,
        profile = %resolved.profile_name,
        interval_secs = monitor.config().filters.poll_interval.as_secs(),
        entities = monitor.entities_snapshot().len(),
        "watching router"
    );

    let signal = tokio::signal::ctrl_c().await;
    monitor.shutdown().await;
    signal?;
    Ok(())
}
