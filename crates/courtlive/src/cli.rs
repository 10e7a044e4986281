//! Clap derive structures for the `courtlive` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use courtlive_core::ProviderKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// courtlive -- live-score data engine for broadcast graphics
#[derive(Debug, Parser)]
#[command(
    name = "courtlive",
    version,
    about = "Keep live-score overlays in sync with the matches on screen",
    long_about = "Runs the live data engine behind score overlays.\n\n\
        Connections pull match state from a simulator, a scoring console,\n\
        a polled API, or the multi-court feed. Bindings map overlay\n\
        components to values inside that state.",
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
    /// Config file to load instead of the platform default
    #[arg(long, env = "COURTLIVE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// State file holding connections and bindings (overrides config)
    #[arg(long, env = "COURTLIVE_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "COURTLIVE_OUTPUT",
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
    /// Run the engine until interrupted, printing court and value updates
    Run(RunArgs),

    /// Manage connections to match data sources
    #[command(alias = "conn", alias = "c")]
    Connections(ConnectionsArgs),

    /// Manage component bindings
    #[command(alias = "bind", alias = "b")]
    Bindings(BindingsArgs),

    /// Resolve the current value of a bound component
    Value(ValueArgs),

    /// Inspect the multi-court feed
    Courts(CourtsArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RUN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Court shown by a display (repeatable; replaces configured displays)
    #[arg(long = "court", value_name = "COURT")]
    pub courts: Vec<String>,

    /// Court sync interval (e.g. "2s", "500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Do not run the court sync task
    #[arg(long)]
    pub no_sync: bool,

    /// Components whose values are printed as they change (repeatable)
    #[arg(long = "watch", value_name = "COMPONENT")]
    pub watch: Vec<String>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONNECTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConnectionsArgs {
    #[command(subcommand)]
    pub command: ConnectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConnectionsCommand {
    /// List configured connections
    #[command(alias = "ls")]
    List,

    /// Show one connection
    Get {
        /// Connection ID or name
        connection: String,
    },

    /// Add a connection
    Add(ConnectionAddArgs),

    /// Change a connection's settings
    Update(ConnectionUpdateArgs),

    /// Remove a connection and every binding that reads from it
    #[command(alias = "rm")]
    Remove {
        /// Connection ID or name
        connection: String,
    },

    /// Mark a connection active so `run` polls it
    Activate {
        /// Connection ID or name
        connection: String,
    },

    /// Stop polling a connection
    Deactivate {
        /// Connection ID or name
        connection: String,
    },

    /// Check that a connection's source is reachable
    Test {
        /// Connection ID or name
        connection: String,
    },

    /// List the matches a polled API knows about
    Matches {
        /// Connection ID or name
        connection: String,
    },
}

#[derive(Debug, Args)]
pub struct ConnectionAddArgs {
    /// Display name
    pub name: String,

    /// Data source: simulated, manual-console, polled-api, streamed-feed
    #[arg(long, short = 'P')]
    pub provider: ProviderKind,

    /// Match endpoint URL (required for polled-api)
    #[arg(long, short = 'e')]
    pub endpoint: Option<String>,

    /// API key sent as a bearer token
    #[arg(long, hide_env = true, env = "COURTLIVE_CONNECTION_KEY")]
    pub credential: Option<String>,

    /// Court to follow (streamed-feed)
    #[arg(long)]
    pub court: Option<String>,

    /// Fold the payload into the canonical tennis shape
    #[arg(long)]
    pub normalize: bool,

    /// Poll interval in seconds
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Activate right away
    #[arg(long)]
    pub activate: bool,
}

#[derive(Debug, Args)]
pub struct ConnectionUpdateArgs {
    /// Connection ID or name
    pub connection: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New data source
    #[arg(long, short = 'P')]
    pub provider: Option<ProviderKind>,

    /// New match endpoint URL
    #[arg(long, short = 'e', conflicts_with = "clear_endpoint")]
    pub endpoint: Option<String>,

    /// Remove the endpoint
    #[arg(long)]
    pub clear_endpoint: bool,

    /// New API key
    #[arg(long, conflicts_with = "clear_credential")]
    pub credential: Option<String>,

    /// Remove the API key
    #[arg(long)]
    pub clear_credential: bool,

    /// New court to follow
    #[arg(long, conflicts_with = "clear_court")]
    pub court: Option<String>,

    /// Follow every court again
    #[arg(long)]
    pub clear_court: bool,

    /// Enable or disable payload normalization
    #[arg(long)]
    pub normalize: Option<bool>,

    /// New poll interval in seconds
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BINDINGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BindingsArgs {
    #[command(subcommand)]
    pub command: BindingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum BindingsCommand {
    /// List component bindings
    #[command(alias = "ls")]
    List,

    /// Bind a component to a value inside a connection's data
    Add {
        /// Component ID
        component: String,

        /// Connection ID or name
        connection: String,

        /// Dot path into the match data (e.g. "score.player1Sets")
        path: String,

        /// Refresh hint for the renderer, in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Change a binding
    Update {
        /// Component ID
        component: String,

        /// Read from another connection (ID or name)
        #[arg(long)]
        connection: Option<String>,

        /// New dot path
        #[arg(long)]
        path: Option<String>,

        /// New refresh hint in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Remove a binding
    #[command(alias = "rm")]
    Remove {
        /// Component ID
        component: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VALUE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ValueArgs {
    /// Component ID
    pub component: String,

    /// How long to wait for the first fetch (e.g. "5s")
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub wait: Duration,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COURTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CourtsArgs {
    #[command(subcommand)]
    pub command: CourtsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CourtsCommand {
    /// Sync once and list the courts with data
    #[command(alias = "ls")]
    List {
        /// Limit to these courts (repeatable; replaces configured displays)
        #[arg(long = "court", value_name = "COURT")]
        courts: Vec<String>,
    },

    /// Sync once and show one court's payload
    Show {
        /// Court name
        court: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file
    Init {
        /// Feed base URL; skips the interactive prompts
        #[arg(long)]
        feed_url: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration with secrets masked
    Show,

    /// Print the config file path
    Path,

    /// Store the feed API key in the system keyring
    SetKey,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
