//! Configuration for netpresence.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation of a profile into `netpresence_core` runtime config. The CLI
//! layers its flag overrides on top.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use netpresence_core::{
    FilterConfig, MonitorConfig, RouterConfig, TlsVerification, clamp_scan_interval,
};

/// Keyring service name for stored router passwords.
pub const KEYRING_SERVICE: &str = "netpresence";

/// Environment variable consulted before the keyring.
pub const PASSWORD_ENV: &str = "NETPRESENCE_PASSWORD";

/// Scan interval written by `config init`.
pub const INIT_SCAN_INTERVAL_SECS: u64 = 300;

const ENV_PREFIX: &str = "NETPRESENCE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named router profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Router host or URL (e.g. "192.168.0.1" or "http://192.168.0.1/").
    #[serde(default = "default_router")]
    pub router: String,

    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring or an env var.
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// Poll interval in seconds, clamped to at least 10.
    pub scan_interval: Option<u64>,

    #[serde(default)]
    pub disabled_ips: Vec<String>,

    /// Legacy MAC-based disable list.
    #[serde(default)]
    pub disabled_macs: Vec<String>,

    /// Display names keyed by IP.
    #[serde(default)]
    pub name_overrides_ip: BTreeMap<String, String>,

    /// Legacy display names keyed by MAC.
    #[serde(default)]
    pub name_overrides: BTreeMap<String, String>,

    /// Accept invalid TLS certificates. Defaults to true.
    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            router: default_router(),
            username: None,
            password: None,
            password_env: None,
            scan_interval: None,
            disabled_ips: Vec::new(),
            disabled_macs: Vec::new(),
            name_overrides_ip: BTreeMap::new(),
            name_overrides: BTreeMap::new(),
            insecure: None,
            timeout: None,
        }
    }
}

fn default_router() -> String {
    "192.168.0.1".into()
}

impl Profile {
    /// Poll interval after defaulting and clamping.
    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
            .map_or(FilterConfig::default().poll_interval, clamp_scan_interval)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "netpresence", "netpresence").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netpresence");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from a specific file + environment.
///
/// A missing file is not an error; defaults and env vars still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Store a router password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

/// Resolve the router username: profile value, then `NETPRESENCE_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("NETPRESENCE_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the router password from the credential chain.
///
/// `password_env`, then `NETPRESENCE_PASSWORD`, then the system keyring,
/// then the plaintext profile value.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env -> env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to runtime config ───────────────────────────────────

/// Turn a host or URL into the router's root URL.
///
/// A bare host gets `http://` since most routers serve their UI unencrypted.
pub fn router_url(router: &str) -> Result<Url, ConfigError> {
    let trimmed = router.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}/")
    };

    let url = Url::parse(&candidate).map_err(|e| ConfigError::Validation {
        field: "router".into(),
        reason: format!("invalid URL '{router}': {e}"),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            field: "router".into(),
            reason: format!("no host in '{router}'"),
        });
    }
    Ok(url)
}

/// Filter and naming settings for a profile.
pub fn profile_filter_config(profile: &Profile) -> FilterConfig {
    let mut filters = FilterConfig::default()
        .disable_ips(&profile.disabled_ips)
        .disable_macs(&profile.disabled_macs);
    for (ip, name) in &profile.name_overrides_ip {
        filters = filters.name_ip(ip, name.trim());
    }
    for (mac, name) in &profile.name_overrides {
        filters = filters.name_mac(mac, name.trim());
    }
    filters.poll_interval = profile.scan_interval();
    filters
}

/// Monitor settings for a profile. The profile name scopes entity ids.
pub fn profile_monitor_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<MonitorConfig, ConfigError> {
    let url = router_url(&profile.router)?;
    let host = url.host_str().unwrap_or_default().to_owned();
    Ok(MonitorConfig::new(profile_name, host).with_filters(profile_filter_config(profile)))
}

/// Build a `RouterConfig` from a profile, with no CLI overrides.
pub fn profile_router_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<RouterConfig, ConfigError> {
    let password = resolve_password(profile, profile_name)?;
    profile_router_config_with_password(profile, profile_name, defaults, password)
}

/// Build a `RouterConfig` using an already-known password.
pub fn profile_router_config_with_password(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    password: SecretString,
) -> Result<RouterConfig, ConfigError> {
    let url = router_url(&profile.router)?;
    let username = resolve_username(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(true) {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(RouterConfig {
        url,
        username,
        password,
        tls,
        timeout,
    })
}
