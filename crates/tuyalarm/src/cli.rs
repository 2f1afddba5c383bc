//! Clap derive structures for the `tuyalarm` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tuyalarm -- drive Tuya siren/strobe alarms from the command line
#[derive(Debug, Parser)]
#[command(
    name = "tuyalarm",
    version,
    about = "Control Tuya alarm sirens from the command line",
    long_about = "Signed client for the Tuya OpenAPI.\n\n\
        Every command prints a JSON envelope on stdout: {\"data\", \"meta\"} on\n\
        success, {\"success\": false, \"error\", \"meta\"} on failure.",
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
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "TUYALARM_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// OpenAPI endpoint (overrides config)
    #[arg(long, short = 'e', global = true)]
    pub endpoint: Option<String>,

    /// Cloud project access id (overrides config)
    #[arg(long, global = true)]
    pub access_id: Option<String>,

    /// Cloud project access secret (overrides config and keyring)
    #[arg(long, global = true, hide = true)]
    pub access_secret: Option<String>,

    /// Output format [default: from config, else json]
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output on success
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON envelope (default)
    Json,
    /// Compact single-line JSON envelope
    JsonCompact,
    /// YAML envelope
    Yaml,
    /// Human-readable table of the payload
    Table,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect devices and send raw commands
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Trigger or silence the alarm
    Alarm(AlarmArgs),

    /// Change a single setting
    Set(SetArgs),

    /// Apply or list presets
    Preset(PresetArgs),

    /// Check credentials and platform connectivity
    Health,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// The device this command targets, if any.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::Devices(args) => match &args.command {
                DevicesCommand::List => None,
                DevicesCommand::Get { device_id }
                | DevicesCommand::Status { device_id }
                | DevicesCommand::Send { device_id, .. } => Some(device_id),
            },
            Self::Alarm(args) => match &args.command {
                AlarmCommand::Activate { device_id }
                | AlarmCommand::Deactivate { device_id }
                | AlarmCommand::TimeToWork { device_id } => Some(device_id),
            },
            Self::Set(args) => match &args.command {
                SetCommand::Volume { device_id, .. }
                | SetCommand::Brightness { device_id, .. }
                | SetCommand::Mode { device_id, .. }
                | SetCommand::Duration { device_id, .. } => Some(device_id),
            },
            Self::Preset(args) => match &args.command {
                PresetCommand::Apply { device_id, .. } => Some(device_id),
                PresetCommand::List => None,
            },
            Self::Health | Self::Completions(_) => None,
        }
    }
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices in the cloud project
    #[command(alias = "ls")]
    List,

    /// Get raw device details
    Get {
        /// Device ID
        device_id: String,
    },

    /// Get status with flattened data points and derived labels
    Status {
        /// Device ID
        device_id: String,
    },

    /// Send raw data-point commands
    #[command(after_help = "Examples:\n  \
        tuyalarm devices send <ID> alarm_volume=high alarm_time=10\n  \
        tuyalarm devices send <ID> --json '[{\"code\":\"alarm_switch\",\"value\":true}]'")]
    Send {
        /// Device ID
        device_id: String,

        /// CODE=VALUE pairs; VALUE is parsed as JSON when possible
        #[arg(value_name = "CODE=VALUE")]
        commands: Vec<String>,

        /// JSON array of {"code", "value"} objects
        #[arg(long, conflicts_with = "commands")]
        json: Option<String>,
    },
}

// ── Alarm ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlarmArgs {
    #[command(subcommand)]
    pub command: AlarmCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlarmCommand {
    /// Full siren and strobe in SOS mode
    Activate {
        /// Device ID
        device_id: String,
    },

    /// Silence and disarm
    Deactivate {
        /// Device ID
        device_id: String,
    },

    /// Short wake-up alarm
    TimeToWork {
        /// Device ID
        device_id: String,
    },
}

// ── Set ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: SetCommand,
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Siren volume: mute, low, middle, high
    Volume {
        /// Device ID
        device_id: String,
        level: String,
    },

    /// Strobe brightness: low, middle, high, strong
    Brightness {
        /// Device ID
        device_id: String,
        level: String,
    },

    /// Master mode: disarmed, arm, home, sos, work, play
    Mode {
        /// Device ID
        device_id: String,
        mode: String,
    },

    /// Alarm duration in seconds (1-60)
    Duration {
        /// Device ID
        device_id: String,
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
}

// ── Preset ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PresetArgs {
    #[command(subcommand)]
    pub command: PresetCommand,
}

#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// Apply a named preset: home, away, night, silent, test
    Apply {
        /// Device ID
        device_id: String,
        name: String,
    },

    /// List presets and the commands they send
    #[command(alias = "ls")]
    List,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
