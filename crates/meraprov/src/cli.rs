//! Clap derive structures for the `meraprov` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// meraprov -- provision Meraki networks from a run definition
#[derive(Debug, Parser)]
#[command(
    name = "meraprov",
    version,
    about = "Provision Meraki networks from a run definition",
    long_about = "Creates a Meraki network, claims the listed devices into it, names and\n\
        locates each device, then binds the network to a configuration template.\n\n\
        The run is described by a TOML file; see `meraprov config show`.",
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
    /// Run definition file (defaults to the platform config directory)
    #[arg(long, short = 'C', env = "MERAPROV_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Dashboard API key
    #[arg(long, env = "MERAKI_DASHBOARD_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MERAPROV_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides the config file)
    #[arg(
        long,
        env = "MERAPROV_TIMEOUT",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Maximum concurrent per-device requests (overrides the config file)
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Device naming policy override.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NamingArg {
    /// Refuse to run when two devices would share a name
    Strict,
    /// Append _2, _3, ... to duplicate names
    Suffix,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Provision the network described by the run definition
    Run(RunArgs),

    /// Validate the run definition and show derived device names (no API calls)
    Plan(RunArgs),

    /// Inspect configuration and manage the stored API key
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Override `network.naming` from the run definition
    #[arg(long)]
    pub naming: Option<NamingArg>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (API key redacted)
    Show,

    /// Print the path of the run definition in use
    Path,

    /// Store the Dashboard API key in the system keyring
    SetKey {
        /// Organization the key belongs to (defaults to the run definition's)
        #[arg(long)]
        organization: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
