//! Clap derive structures for the `fleetops` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use fleetops_core::EntityKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetops -- fleet maintenance and operations records from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "fleetops",
    version,
    about = "Manage fleet operations records from the command line",
    long_about = "Aircraft, work orders, maintenance schedules, parts inventory,\n\
        compliance records, predictive alerts and telemetry, stored in a\n\
        PostgREST-style table backend.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "FLEETOPS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Project URL (overrides profile)
    #[arg(long, short = 'u', env = "FLEETOPS_URL", global = true)]
    pub url: Option<String>,

    /// Project API key
    #[arg(long, env = "FLEETOPS_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEETOPS_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FLEETOPS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "FLEETOPS_TIMEOUT", global = true)]
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
    /// Manage aircraft
    #[command(alias = "ac")]
    Aircraft(RecordArgs),

    /// Manage work orders
    #[command(alias = "wo")]
    WorkOrders(WorkOrdersArgs),

    /// Manage maintenance schedules
    #[command(alias = "mx")]
    Maintenance(MaintenanceArgs),

    /// Manage parts inventory
    #[command(alias = "inv", alias = "parts")]
    Inventory(InventoryArgs),

    /// Manage compliance records
    Compliance(RecordArgs),

    /// Manage predictive alerts
    Alerts(AlertsArgs),

    /// View air traffic telemetry
    #[command(alias = "atc")]
    Telemetry(RecordArgs),

    /// Aggregates for one entity list
    Stats(StatsArgs),

    /// Fleet overview: counts, recent alerts, upcoming maintenance
    #[command(alias = "dash")]
    Dashboard,

    /// Fleet-wide performance figures
    Analytics,

    /// Show the signed-in user and profile
    Whoami,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// The entity a record command targets.
    pub fn entity(&self) -> Option<EntityKind> {
        match self {
            Self::Aircraft(_) => Some(EntityKind::Aircraft),
            Self::WorkOrders(_) => Some(EntityKind::WorkOrders),
            Self::Maintenance(_) => Some(EntityKind::Maintenance),
            Self::Inventory(_) => Some(EntityKind::Inventory),
            Self::Compliance(_) => Some(EntityKind::Compliance),
            Self::Alerts(_) => Some(EntityKind::Alerts),
            Self::Telemetry(_) => Some(EntityKind::Telemetry),
            _ => None,
        }
    }
}

// ── Shared Record Arguments ──────────────────────────────────────────

/// Shared filtering arguments for all list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Max rows to fetch
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,

    /// Column filter, repeatable: `status=operational`, `severity!=low`
    #[arg(long, short = 'f', value_name = "COLUMN=VALUE")]
    pub filter: Vec<String>,
}

/// Field assignments for add/edit.
#[derive(Debug, Args)]
pub struct SetArgs {
    /// Field value, repeatable: `--set tail_number=N512FO`. Reference
    /// fields take an id or a label (`--set aircraft_id=N512FO`).
    #[arg(long = "set", short = 's', value_name = "FIELD=VALUE")]
    pub set: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// List records in backend order
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record's details
    #[command(alias = "get")]
    Show {
        /// Record ID
        id: String,
    },

    /// Create a record (unset fields take their defaults)
    #[command(alias = "create")]
    Add(SetArgs),

    /// Change fields on a record
    #[command(alias = "update")]
    Edit {
        /// Record ID
        id: String,

        #[command(flatten)]
        set: SetArgs,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record ID
        id: String,
    },

    /// List editable fields and their kinds
    Fields,

    /// List the rows a reference field may point at
    Choices {
        /// Reference field name (e.g. aircraft_id)
        field: String,
    },
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: RecordCommand,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENTITY-SPECIFIC ACTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WorkOrdersArgs {
    #[command(subcommand)]
    pub command: WorkOrdersCommand,
}

#[derive(Debug, Subcommand)]
pub enum WorkOrdersCommand {
    #[command(flatten)]
    Record(RecordCommand),

    /// Move a work order to its next status (start, complete, reopen)
    Advance {
        /// Work order ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct MaintenanceArgs {
    #[command(subcommand)]
    pub command: MaintenanceCommand,
}

#[derive(Debug, Subcommand)]
pub enum MaintenanceCommand {
    #[command(flatten)]
    Record(RecordCommand),

    /// Mark a schedule performed now and roll its next due date
    Complete {
        /// Schedule ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct InventoryArgs {
    #[command(subcommand)]
    pub command: InventoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    #[command(flatten)]
    Record(RecordCommand),

    /// Add or remove stock
    Adjust {
        /// Part ID
        id: String,

        /// Units to add
        #[arg(long, conflicts_with = "remove", required_unless_present = "remove")]
        add: Option<i64>,

        /// Units to remove
        #[arg(long)]
        remove: Option<i64>,
    },
}

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    #[command(flatten)]
    Record(RecordCommand),

    /// Acknowledge an alert
    #[command(alias = "ack")]
    Acknowledge {
        /// Alert ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Entity to summarize
    #[arg(value_parser = parse_entity)]
    pub entity: EntityKind,
}

fn parse_entity(raw: &str) -> Result<EntityKind, String> {
    raw.parse().map_err(|_| {
        let names: Vec<&str> = <EntityKind as strum::IntoEnumIterator>::iter()
            .map(Into::into)
            .collect();
        format!("unknown entity '{raw}' (expected one of: {})", names.join(", "))
    })
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
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a profile value
    Set {
        /// Profile key (url, schema, auth_mode, api_key_env, email, ca_cert, insecure, timeout)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the profile's secrets in the system keyring
    SetKey {
        /// Profile to update (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
