//! Command line arguments for cisbench.
//!
//! Audit flags are global, so `cisbench -l 1` and `cisbench check -l 1` are
//! equivalent. Environment fallbacks: `CISBENCH_USER`, `CISBENCH_SETTINGS`,
//! `NO_COLOR`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::Level;

use crate::engine::scheduler::ExecutionMode;

#[derive(Debug, Parser)]
#[command(name = "cisbench")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit a running PostgreSQL server against a CIS-style benchmark", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub check: CheckArgs,
}

impl Cli {
    /// Command to execute; `check` when none was given
    pub fn command(&self) -> Command {
        self.command.unwrap_or_default()
    }
}

/// Command to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Subcommand)]
pub enum Command {
    /// Run the benchmark (default)
    #[default]
    Check,
    /// List the check catalogue
    List,
    /// Print version information
    Version,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned, grouped report
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
    /// One comma-delimited record per check
    Csv,
}

/// Flags controlling an audit run
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Step-debug: run checks one at a time, pausing before each
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Trace: run checks one at a time with trace logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run only checks of this level (1 or 2); repeat for both
    #[arg(
        short = 'l',
        long = "level",
        global = true,
        action = ArgAction::Append,
        value_parser = clap::value_parser!(u8).range(1..=2)
    )]
    pub levels: Vec<u8>,

    /// Space-delimited check ids to include, with their ancestors and descendants
    #[arg(short, long, global = true, action = ArgAction::Append)]
    pub include: Vec<String>,

    /// Space-delimited check ids to exclude, with their descendants
    #[arg(short, long, global = true, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Do not lower the CPU priority before running checks
    #[arg(short = 'n', long = "no-nice", global = true, overrides_with = "nice")]
    pub no_nice: bool,

    /// Lower the CPU priority before running checks (default)
    #[arg(long, global = true, overrides_with = "no_nice")]
    pub nice: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Do not draw the live progress line
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Account the server must run as
    #[arg(short, long, global = true, env = "CISBENCH_USER")]
    pub user: Option<String>,

    /// Maximum number of checks running at once [default: 10]
    #[arg(short = 'j', long, global = true)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// TOML settings file
    #[arg(long, global = true, env = "CISBENCH_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Server configuration file
    #[arg(long, global = true)]
    pub server_config: Option<PathBuf>,

    /// Server data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Server process name
    #[arg(long = "process", global = true)]
    pub process_name: Option<String>,
}

impl CheckArgs {
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.debug {
            ExecutionMode::Step
        } else if self.verbose {
            ExecutionMode::Trace
        } else {
            ExecutionMode::Concurrent
        }
    }

    /// Default log level; `RUST_LOG` still overrides it
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::TRACE
        } else if self.debug {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }

    /// Whether to renice, given the settings-file default
    pub fn nice_enabled(&self, default: bool) -> bool {
        if self.no_nice {
            false
        } else if self.nice {
            true
        } else {
            default
        }
    }

    /// `--no-color` or a non-empty `NO_COLOR`
    pub fn color_disabled(&self) -> bool {
        self.no_color || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
    }
}
