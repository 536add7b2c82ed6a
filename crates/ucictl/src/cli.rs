//! Clap derive structures for the `ucictl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ucictl -- apply staged UCI configuration without locking yourself out
#[derive(Debug, Parser)]
#[command(
    name = "ucictl",
    version,
    about = "Apply, confirm and roll back staged UCI configuration",
    long_about = "Applies the staged configuration changes of a UCI-managed device.\n\n\
        A checked apply must be confirmed from the same client within the\n\
        rollback window; if the new configuration cuts the client off, the\n\
        device restores the previous configuration on its own.",
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
    /// Device profile to use
    #[arg(long, short = 'p', env = "UCICTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device URL (overrides profile)
    #[arg(long, short = 'c', env = "UCICTL_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Session id
    #[arg(long, env = "UCICTL_SID", global = true, hide_env = true)]
    pub sid: Option<String>,

    /// Anti-CSRF token of the session
    #[arg(long, env = "UCICTL_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "UCICTL_OUTPUT",
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

    /// Skip prompts: apply with rollback protection, dismiss after a rollback
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "UCICTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "UCICTL_TIMEOUT", global = true)]
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
    /// Plain text, one value per line (scripting)
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Http,
    Https,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List staged configuration changes
    #[command(alias = "ch")]
    Changes(ChangesArgs),

    /// Apply staged changes (with rollback protection by default)
    Apply(ApplyArgs),

    /// Discard all staged changes
    Revert,

    /// Wait until the device answers again
    Reconnect(ReconnectArgs),

    /// Check whether a host answers over HTTP(S)
    Probe(ProbeArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Changes ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChangesArgs {
    /// Only show changes to this configuration file (e.g. "network")
    #[arg(long)]
    pub config: Option<String>,

    /// Print only the number of staged changes
    #[arg(long)]
    pub count: bool,
}

// ── Apply ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Apply without rollback protection
    #[arg(long)]
    pub unchecked: bool,
}

// ── Reconnect ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReconnectArgs {
    /// Hosts to try (default: the profile's reconnect hosts, then the device host)
    pub hosts: Vec<String>,
}

// ── Probe ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Host (with optional port) to probe
    pub host: String,

    /// Only probe this protocol
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolArg>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the effective configuration (secrets masked)
    Show,

    /// Print the configuration file path
    Path,

    /// Store a profile's session id and token in the system keyring
    SetSecret {
        /// Profile to update (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
