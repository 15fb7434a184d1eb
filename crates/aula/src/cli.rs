//! Clap derive structures for the `aula` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of workspace crates so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aula -- operate the auditorium AV system from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "aula",
    version,
    about = "Operate the auditorium AV control server from the command line",
    long_about = "Switch operating modes, follow the audit trail and administer \
        users and server settings of an auditorium AV control server.\n\n\
        Connection details come from profiles in the config file \
        (see `aula config init`), AULA_* environment variables or flags.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "AULA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "AULA_SERVER", global = true)]
    pub server: Option<String>,

    /// Login name (overrides profile)
    #[arg(long, short = 'u', env = "AULA_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "AULA_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, env = "AULA_COLOR", global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "AULA_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: from profile, else 30]
    #[arg(long, env = "AULA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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
    /// Show the current mode, CPU load and latency
    #[command(alias = "st")]
    Status,

    /// Switch the operating mode
    #[command(alias = "m")]
    Mode(ModeArgs),

    /// Show the most recent audit log entries
    #[command(alias = "log")]
    Logs(LogsArgs),

    /// Manage user accounts
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Search, clean up and export the audit log
    Audit(AuditArgs),

    /// Show summary statistics
    Stats,

    /// Show usage analytics
    Analytics(AnalyticsArgs),

    /// View and edit server configuration entries
    #[command(alias = "set")]
    Settings(SettingsArgs),

    /// Verify the profile's credentials against the server
    Login,

    /// End the server session
    Logout,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Mode ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModeArgs {
    /// Target mode (`off` asks for confirmation unless --yes)
    pub mode: ModeArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Conferencia,
    Cine,
    Standby,
    Off,
}

// ── Logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Number of entries to show (1-100) [default: from config, else 20]
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: Option<u32>,

    /// Keep refreshing the list
    #[arg(long, short = 'f')]
    pub follow: bool,

    /// Refresh period in seconds when following
    #[arg(
        long,
        default_value = "10",
        requires = "follow",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List user accounts
    #[command(alias = "ls")]
    List,

    /// Create a user, or update one with --id
    Save(UserSaveArgs),

    /// Deactivate a user account
    #[command(alias = "rm")]
    Deactivate {
        /// User id (see `aula users list`)
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct UserSaveArgs {
    /// Existing user id; omit to create a new account
    #[arg(long)]
    pub id: Option<i64>,

    /// Login name
    #[arg(long)]
    pub username: String,

    /// New password (prompted for when creating without one)
    #[arg(long, env = "AULA_NEW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Role: admin or operador
    #[arg(long, default_value = "operador")]
    pub role: String,

    /// Display name
    #[arg(long)]
    pub full_name: Option<String>,

    /// Contact address
    #[arg(long)]
    pub email: Option<String>,

    /// Mark the account inactive
    #[arg(long, conflicts_with = "active")]
    pub inactive: bool,

    /// Mark the account active
    #[arg(long)]
    pub active: bool,
}

// ── Audit ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// Search the audit log
    #[command(alias = "find")]
    Search(AuditSearchArgs),

    /// Delete records older than a number of days
    Cleanup {
        /// Age threshold in days
        #[arg(long, short = 'd')]
        days: u32,
    },

    /// Download the audit log as CSV
    Export {
        /// Number of records to export
        #[arg(long, short = 'l', default_value = "1000")]
        limit: u32,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct AuditSearchArgs {
    /// Exact user name
    #[arg(long)]
    pub user: Option<String>,

    /// Level (INFO, WARNING, ERROR, ...)
    #[arg(long)]
    pub level: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Event name substring
    #[arg(long)]
    pub event: Option<String>,

    /// Maximum number of results (1-1000)
    #[arg(long, short = 'l', default_value = "50")]
    pub limit: u32,
}

// ── Analytics ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    /// Feed to show; users, modes and timeline when omitted
    pub section: Option<AnalyticsArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalyticsArg {
    /// Most active users
    Users,
    /// Usage per mode
    Modes,
    /// Recent mode changes
    Timeline,
    /// Events per day
    Daily,
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// List configuration entries
    #[command(alias = "ls")]
    List {
        /// Only entries of this category
        #[arg(long, short = 'c')]
        category: Option<String>,
    },

    /// Change one entry; the value is checked against its type
    Set {
        /// Entry key
        key: String,
        /// New value
        value: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Key (server, username, password_env, insecure, ca_cert, timeout)
        key: String,
        /// Value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile to update (defaults to the active one)
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
