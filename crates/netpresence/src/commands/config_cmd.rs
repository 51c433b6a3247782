//! Config subcommand handlers.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, IsTerminal};

use dialoguer::Input;
use serde::Serialize;

use netpresence_core::clamp_scan_interval;
use netpresence_core::filter::{
    format_list_text, format_mapping_text, parse_disabled_ips, parse_disabled_macs,
    parse_name_overrides_ip, parse_name_overrides_mac,
};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OptionsArgs};
use crate::config::{self, Config, INIT_SCAN_INTERVAL_SECS, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Use `given`, or prompt for it when stdin is a terminal.
fn value_or_prompt(
    given: Option<&str>,
    field: &str,
    prompt: &str,
    default: Option<&str>,
) -> Result<String, CliError> {
    if let Some(value) = given {
        return Ok(value.to_owned());
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: format!("--{field} is required when not running interactively"),
        });
    }
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_owned());
    }
    input.interact_text().map_err(prompt_err)
}

fn password_or_prompt(given: Option<&str>) -> Result<String, CliError> {
    let password = match given {
        Some(password) => password.to_owned(),
        None if io::stdin().is_terminal() => {
            rpassword::prompt_password("Password: ").map_err(prompt_err)?
        }
        None => {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "--password is required when not running interactively".into(),
            });
        }
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(password)
}

/// Copy of the config with every plaintext password masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    cfg
}

// ── Options view ────────────────────────────────────────────────────

/// A profile's filter and naming options as the options form shows them.
#[derive(Debug, Serialize)]
struct OptionsView {
    scan_interval: u64,
    disabled_ips: Vec<String>,
    disabled_macs: Vec<String>,
    name_overrides_ip: BTreeMap<String, String>,
    name_overrides: BTreeMap<String, String>,
}

impl From<&Profile> for OptionsView {
    fn from(profile: &Profile) -> Self {
        Self {
            scan_interval: profile.scan_interval().as_secs(),
            disabled_ips: profile.disabled_ips.clone(),
            disabled_macs: profile.disabled_macs.clone(),
            name_overrides_ip: profile.name_overrides_ip.clone(),
            name_overrides: profile.name_overrides.clone(),
        }
    }
}

fn write_options(out: &mut String, view: &OptionsView) {
    let _ = writeln!(out, "scan_interval = {}", view.scan_interval);
    let _ = writeln!(out, "disabled_ips = {}", format_list_text(&view.disabled_ips));
    let _ = writeln!(out, "disabled_macs = {}", format_list_text(&view.disabled_macs));
    write_mapping(out, "name_overrides_ip", &view.name_overrides_ip);
    write_mapping(out, "name_overrides", &view.name_overrides);
}

fn write_mapping(out: &mut String, label: &str, mapping: &BTreeMap<String, String>) {
    let _ = writeln!(out, "{label}:");
    for line in format_mapping_text(mapping).lines() {
        let _ = writeln!(out, "  {line}");
    }
}

fn format_options(view: &OptionsView) -> String {
    let mut out = String::new();
    write_options(&mut out, view);
    out.trim_end().to_owned()
}

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "router = \"{}\"", p.router);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"{REDACTED}\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        write_options(&mut out, &OptionsView::from(p));
    }

    out.trim_end().to_owned()
}

/// Apply every option flag that was given. Empty text clears the option.
fn apply_options(profile: &mut Profile, args: &OptionsArgs) {
    if let Some(secs) = args.scan_interval {
        profile.scan_interval = Some(clamp_scan_interval(secs).as_secs());
    }
    if let Some(ref text) = args.disabled_ips {
        profile.disabled_ips = parse_disabled_ips(text);
    }
    if let Some(ref text) = args.disabled_macs {
        profile.disabled_macs = parse_disabled_macs(text);
    }
    if let Some(ref text) = args.name_overrides_ip {
        profile.name_overrides_ip = parse_name_overrides_ip(text);
    }
    if let Some(ref text) = args.name_overrides {
        profile.name_overrides = parse_name_overrides_mac(text);
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init { plaintext } => {
            let mut cfg = config::load_config()?;
            let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());

            let router = value_or_prompt(
                global.router.as_deref(),
                "router",
                "Router host or URL",
                Some("192.168.0.1"),
            )?;
            config::router_url(&router)?;
            let username =
                value_or_prompt(global.username.as_deref(), "username", "Username", None)?;
            let password = password_or_prompt(global.password.as_deref())?;

            let password = if plaintext {
                Some(password)
            } else {
                config::store_password(&profile_name, &password)?;
                if !global.quiet {
                    eprintln!("✓ Password stored in system keyring");
                }
                None
            };

            let previous = cfg.profiles.remove(&profile_name).unwrap_or_default();
            let profile = Profile {
                router,
                username: Some(username),
                password,
                scan_interval: Some(INIT_SCAN_INTERVAL_SECS),
                insecure: global.insecure.then_some(true).or(previous.insecure),
                timeout: global.timeout.or(previous.timeout),
                ..previous
            };
            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }

            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Profile '{profile_name}' written to {}", path.display());
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(&global.output, &cfg, format_config_redacted)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Options ─────────────────────────────────────────────────
        ConfigCommand::Options(opts) => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);

            if opts.is_empty() {
                let profile = cfg.profiles.get(&profile_name).ok_or_else(|| {
                    CliError::ProfileNotFound {
                        name: profile_name.clone(),
                        available: available_profiles(&cfg),
                    }
                })?;
                let view = OptionsView::from(profile);
                let out = output::render_single(&global.output, &view, format_options)?;
                output::print_output(&out, global.quiet);
                return Ok(());
            }

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            apply_options(profile, &opts);
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Updated options on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let password = password_or_prompt(global.password.as_deref())?;
            config::store_password(&profile_name, &password)?;
            if !global.quiet {
                eprintln!("✓ Password for profile '{profile_name}' stored in system keyring");
            }
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
