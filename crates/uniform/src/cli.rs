//! Clap derive structures for the `uniform` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// uniform -- declarative device and client management for UniFi
#[derive(Debug, Parser)]
#[command(
    name = "uniform",
    version,
    about = "Declaratively manage UniFi devices and clients",
    long_about = "Adopt, configure, and forget UniFi network devices from plan files,\n\
        and keep known-client records in sync. State is written back as JSON\n\
        so repeated runs converge without redundant controller writes.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "UNIFI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Controller URL (overrides profile and UNIFI_API)
    #[arg(long, short = 'c', global = true)]
    pub controller: Option<String>,

    /// Site name (overrides profile and UNIFI_SITE)
    #[arg(long, short = 's', global = true)]
    pub site: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Adopt, configure, and forget network devices
    #[command(alias = "dev", alias = "d")]
    Device(DeviceArgs),

    /// Manage known-client (user) records
    #[command(alias = "u")]
    User(UserArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared resource arguments ────────────────────────────────────────

/// Plan + optional prior state for an apply.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Desired configuration (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub plan: PathBuf,

    /// Persisted state. Updated in place; created when absent.
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StateArgs {
    /// Persisted state written by a previous apply or import
    #[arg(long, value_name = "FILE")]
    pub state: PathBuf,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// `site:id`, `id`, `site:mac`, or `mac`
    pub id: String,

    /// Write the imported state to this file
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,
}

// ── Device ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// List devices known to the site, adopted or pending
    #[command(alias = "ls")]
    List,

    /// Bring an existing device under management
    Import(ImportArgs),

    /// Adopt and configure a device (update when state exists)
    Apply(ApplyArgs),

    /// Refresh persisted state from the controller
    Read(StateArgs),

    /// Forget the device (honours forget_on_destroy)
    Destroy(StateArgs),
}

// ── User ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Bring an existing client record under management
    Import(ImportArgs),

    /// Register or update a client record
    Apply(ApplyArgs),

    /// Refresh persisted state from the controller
    Read(StateArgs),

    /// Forget the client record (honours skip_forget_on_destroy)
    Destroy(StateArgs),
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
