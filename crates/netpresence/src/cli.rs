//! Clap derive structures for the `netpresence` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netpresence -- device presence from your router's host table
#[derive(Debug, Parser)]
#[command(
    name = "netpresence",
    version,
    about = "Track which devices are home using your router's host table",
    long_about = "Polls the web interface of a Technicolor home router for its host table\n\
        and turns every device it has seen into a stable presence entity\n\
        (home / not_home), with disable lists and display-name overrides.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Router profile to use
    #[arg(long, short = 'p', env = "NETPRESENCE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router host or URL (overrides profile)
    #[arg(long, short = 'r', env = "NETPRESENCE_ROUTER", global = true)]
    pub router: Option<String>,

    /// Router username (overrides profile)
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Router password (overrides every other credential source)
    #[arg(long, global = true, hide = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETPRESENCE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "NETPRESENCE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "NETPRESENCE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one IP per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the router's current host table
    #[command(alias = "ls")]
    Hosts(HostsArgs),

    /// Track presence continuously, printing changes as they happen
    Watch(WatchArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Hosts / Watch ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HostsArgs {
    /// Only show devices that are currently online
    #[arg(long)]
    pub online: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Reconcile once, print the entities and exit
    #[arg(long)]
    pub once: bool,

    /// Poll interval in seconds (overrides profile, minimum 10)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or replace a profile (prompts for anything not given)
    Init {
        /// Store the password in the config file instead of the keyring
        #[arg(long)]
        plaintext: bool,
    },

    /// Display current configuration
    Show,

    /// View or edit a profile's filter and naming options
    ///
    /// Lists take comma or newline separated values. Mappings take one
    /// `key = name` per line. An empty string clears the option.
    Options(OptionsArgs),

    /// Store the router password in the system keyring
    SetPassword,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Poll interval in seconds (minimum 10)
    #[arg(long)]
    pub scan_interval: Option<u64>,

    /// IP addresses to ignore, e.g. "10.0.0.9, 10.0.0.10"
    #[arg(long)]
    pub disabled_ips: Option<String>,

    /// MAC addresses to ignore
    #[arg(long)]
    pub disabled_macs: Option<String>,

    /// Display names by IP, e.g. "10.0.0.5 = Desk PC"
    #[arg(long)]
    pub name_overrides_ip: Option<String>,

    /// Display names by MAC, e.g. "aa:bb:cc:dd:ee:ff = Alice's Phone"
    #[arg(long)]
    pub name_overrides: Option<String>,
}

impl OptionsArgs {
    pub fn is_empty(&self) -> bool {
        self.scan_interval.is_none()
            && self.disabled_ips.is_none()
            && self.disabled_macs.is_none()
            && self.name_overrides_ip.is_none()
            && self.name_overrides.is_none()
    }
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
