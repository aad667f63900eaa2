//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// DIC Syncer - trigger time-base reconciliation for DIC test rigs
#[derive(Parser, Debug)]
#[command(
    name = "dic-syncer",
    author,
    version,
    about = "Synchronize test-machine data with DIC camera frames",
    long_about = "Reconciles the test-machine clock with the camera trigger controller clock.\n\n\
                  Detects trigger edges in the machine stream, estimates the clock offset, \n\
                  interpolates machine channels at every captured frame and writes a \n\
                  frame-indexed export for the image-correlation tool."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DIC_SYNCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "DIC_SYNCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize one test and write the output files
    Sync(SyncArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display resolved configuration and input files
    Info(InfoArgs),
}

/// Configuration source and overrides shared by `sync` and `info`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "DIC_SYNCER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Test directory holding Raw_Data/ (overrides test.dir)
    #[arg(short, long, env = "DIC_SYNCER_TEST_DIR")]
    pub test_dir: Option<PathBuf>,

    /// Systematic lag compensation in ms (overrides clock.offset_constant_ms)
    #[arg(long, env = "DIC_SYNCER_OFFSET_MS", allow_negative_numbers = true)]
    pub offset_ms: Option<f64>,

    /// Edge/trigger pairing strictness (overrides clock.mode)
    #[arg(long, value_enum, env = "DIC_SYNCER_MODE")]
    pub mode: Option<AlignMode>,

    /// Output directory (overrides output.dir)
    #[arg(short, long, env = "DIC_SYNCER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the `sync` command
#[derive(Parser, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Run every stage and print the summary without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "DIC_SYNCER_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Pairing mode
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignMode {
    /// Edge and trigger counts must match
    Strict,
    /// Pair the common prefix and warn
    BestEffort,
}

impl From<AlignMode> for contracts::AlignmentMode {
    fn from(mode: AlignMode) -> Self {
        match mode {
            AlignMode::Strict => contracts::AlignmentMode::Strict,
            AlignMode::BestEffort => contracts::AlignmentMode::BestEffort,
        }
    }
}
