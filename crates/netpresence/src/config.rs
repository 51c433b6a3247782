//! CLI configuration: thin wrapper around `netpresence_config`.
//!
//! Re-exports the shared types and adds resolution that respects the
//! global flag overrides (--router, --username, --password, ...).

use secrecy::SecretString;

use netpresence_core::{MonitorConfig, RouterConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netpresence_config::{
    Config, INIT_SCAN_INTERVAL_SECS, Profile, config_path, load_config, load_config_or_default,
    router_url, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Everything a router-facing command needs, resolved once.
pub struct Resolved {
    pub profile_name: String,
    pub router: RouterConfig,
    pub monitor: MonitorConfig,
}

/// Pick the active profile and apply flag overrides.
///
/// Without a matching profile, `--router` alone is enough to build one
/// from defaults.
pub fn effective_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, cfg);

    let mut profile = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.router.is_some() => Profile::default(),
        None if cfg.profiles.is_empty() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        None => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: available.join(", "),
            });
        }
    };

    if let Some(ref router) = global.router {
        profile.router.clone_from(router);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    Ok((name, profile))
}

/// Translate config + global flags into core runtime config.
///
/// `--password` wins over the whole credential chain.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Resolved, CliError> {
    let (profile_name, profile) = effective_profile(global, cfg)?;

    let router = match global.password {
        Some(ref password) => netpresence_config::profile_router_config_with_password(
            &profile,
            &profile_name,
            &cfg.defaults,
            SecretString::from(password.clone()),
        )?,
        None => netpresence_config::profile_router_config(&profile, &profile_name, &cfg.defaults)?,
    };
    let monitor = netpresence_config::profile_monitor_config(&profile, &profile_name)?;

    Ok(Resolved {
        profile_name,
        router,
        monitor,
    })
}
