//! cisbench library
//!
//! Audits a running PostgreSQL server's configuration against a catalogue of
//! CIS-style compliance checks and produces a pass/fail report.
//!
//! The crate is organised around a small orchestration engine:
//! - [`engine::selector`] decides which catalogue entries run
//! - [`engine::scheduler`] dispatches them with bounded concurrency
//! - [`engine::progress`] draws a live status line while they run
//! - [`engine::result`] collects one row per executed check
//! - [`cli::output`] renders the final report
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cisbench::platform::linux::LinuxFacts;
//! use cisbench::{checks, run_audit, AuditConfig};
//!
//! # async fn demo() -> Result<(), cisbench::AuditError> {
//! let registry = checks::default_registry()?;
//! let report = run_audit(&AuditConfig::default(), &registry, Arc::new(LinuxFacts::new())).await?;
//! println!("Checks failed: {}", report.summary().failed);
//! # Ok(())
//! # }
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod platform;
pub mod telemetry;
pub mod version;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use cli::args::CheckArgs;
use config::Settings;
use engine::context::{RunContext, RunStage};
use engine::progress::ProgressMonitor;
use engine::result::ResultSink;
use engine::scheduler::{Scheduler, SchedulerConfig, DEFAULT_MAX_CONCURRENCY};
use engine::timing::Stopwatch;
use platform::SystemFacts;

// Re-exports for public API
pub use checks::{Check, CheckContext, CheckRegistry, SectionHeader, TargetSettings, Verdict};
pub use engine::result::{ResultSummary, RunReport, TestResult};
pub use engine::scheduler::ExecutionMode;
pub use engine::selector::{SelectionCriteria, Selector};

/// Scoring classification of a catalogue check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scoring {
    /// Outcome counts toward the pass/fail status of the run
    Scored,
    /// Advisory: tallied, but never affects the run status
    NotScored,
    /// Not evaluated by the engine (manual or policy review)
    Skipped,
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoring::Scored => write!(f, "Scored"),
            Scoring::NotScored => write!(f, "Not Scored"),
            Scoring::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Result recorded for one executed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Condition met
    Pass,
    /// Condition not met
    Fail,
    /// The check could not evaluate the target
    Error,
    /// Not evaluated (skipped before evaluation)
    #[default]
    #[serde(rename = "")]
    NotEvaluated,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "PASS"),
            Outcome::Fail => write!(f, "FAIL"),
            Outcome::Error => write!(f, "ERROR"),
            Outcome::NotEvaluated => Ok(()),
        }
    }
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => Outcome::Pass,
            Verdict::Fail => Outcome::Fail,
        }
    }
}

/// Static description of a catalogue check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDescriptor {
    /// Dotted hierarchical identifier (e.g. "3.1.2")
    pub id: String,
    /// Required level: 0 = any, 1 = baseline, 2 = strict
    pub level: u8,
    /// Scoring classification
    pub scoring: Scoring,
    /// Human-readable description
    pub description: String,
}

impl CheckDescriptor {
    pub fn new(
        id: impl Into<String>,
        level: u8,
        scoring: Scoring,
        description: impl Into<String>,
    ) -> Self {
        CheckDescriptor {
            id: id.into(),
            level,
            scoring,
            description: description.into(),
        }
    }
}

/// Error types for cisbench operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// I/O error while reading a system fact
    #[error("I/O error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    /// A fact was readable but not understood
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },
    /// Something the check needs does not exist on the target
    #[error("{what} not found")]
    NotFound { what: String },
    /// Settings file or resolved configuration is invalid
    #[error("Invalid settings: {0}")]
    Settings(String),
    /// Catalogue registration rejected an entry
    #[error("Invalid catalogue entry '{id}': {reason}")]
    Catalogue { id: String, reason: String },
    /// External command failed
    #[error("Command '{command}' error: {message}")]
    Command { command: String, message: String },
    /// The orchestration engine itself failed
    #[error("Engine error: {0}")]
    Engine(String),
}

impl AuditError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AuditError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Resolved configuration for one audit run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Level/include/exclude filters
    pub criteria: SelectionCriteria,
    /// The server under audit
    pub target: TargetSettings,
    /// Maximum number of checks running at once
    pub max_concurrency: usize,
    /// Concurrent, trace or step-debug execution
    pub mode: ExecutionMode,
    /// Draw the live progress line on stderr
    pub show_progress: bool,
    /// Lower the process CPU priority before running checks
    pub lower_priority: bool,
    /// Colorize terminal output (still requires a TTY)
    pub color: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            criteria: SelectionCriteria::default(),
            target: TargetSettings::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            mode: ExecutionMode::Concurrent,
            show_progress: true,
            lower_priority: true,
            color: true,
        }
    }
}

impl AuditConfig {
    /// Resolve configuration from command line arguments layered over a
    /// settings file. Command line values win.
    pub fn resolve(args: &CheckArgs, settings: &Settings) -> Result<Self, AuditError> {
        let mut target = TargetSettings::default();
        settings.target.apply(&mut target);
        if let Some(ref user) = args.user {
            target.user = user.clone();
        }
        if let Some(ref process) = args.process_name {
            target.process_name = process.clone();
        }
        if let Some(ref path) = args.server_config {
            target.config_file = path.clone();
        }
        if let Some(ref path) = args.data_dir {
            target.data_dir = path.clone();
        }

        let level_filter = if args.levels.is_empty() {
            match settings.run.level.unwrap_or(0) {
                level @ 0..=2 => level,
                other => {
                    return Err(AuditError::Settings(format!(
                        "run.level must be 0, 1 or 2 (got {})",
                        other
                    )))
                }
            }
        } else {
            SelectionCriteria::level_from(&args.levels)
        };

        let include = if args.include.is_empty() {
            settings.run.include.clone().unwrap_or_default()
        } else {
            args.include.clone()
        };
        let exclude = if args.exclude.is_empty() {
            settings.run.exclude.clone().unwrap_or_default()
        } else {
            args.exclude.clone()
        };

        let max_concurrency = args
            .jobs
            .or(settings.run.max_concurrency)
            .unwrap_or(DEFAULT_MAX_CONCURRENCY);
        if max_concurrency == 0 {
            return Err(AuditError::Settings(
                "maximum concurrency must be at least 1".to_string(),
            ));
        }

        Ok(AuditConfig {
            criteria: SelectionCriteria::new(
                level_filter,
                SelectionCriteria::parse_id_list(&include),
                SelectionCriteria::parse_id_list(&exclude),
            ),
            target,
            max_concurrency,
            mode: args.execution_mode(),
            show_progress: !args.no_progress && settings.run.progress.unwrap_or(true),
            lower_priority: args.nice_enabled(settings.run.nice.unwrap_or(true)),
            color: !args.color_disabled() && settings.run.color.unwrap_or(true),
        })
    }
}

/// Run an audit of the catalogue against the target described in `config`.
///
/// Walks the registry in catalogue order, dispatches every check the
/// selector accepts, waits for all of them at the join barrier and returns
/// the collected report. Progress is drawn on stderr while checks run unless
/// disabled or running in a sequential mode.
pub async fn run_audit(
    config: &AuditConfig,
    registry: &CheckRegistry,
    facts: Arc<dyn SystemFacts>,
) -> Result<RunReport, AuditError> {
    let stopwatch = Stopwatch::start();
    let run = Arc::new(RunContext::new());
    let (sink, writer) = ResultSink::open();
    let context = Arc::new(CheckContext::new(config.target.clone(), facts));
    let selector = Selector::new(&config.criteria);

    let monitor = if config.show_progress && !config.mode.is_sequential() {
        Some(ProgressMonitor::new(run.clone()).spawn(std::io::stderr()))
    } else {
        None
    };

    let mut scheduler = Scheduler::new(
        run.clone(),
        SchedulerConfig {
            max_concurrency: config.max_concurrency,
            mode: config.mode,
        },
        writer,
    );

    for entry in registry.checks() {
        let descriptor = entry.descriptor();
        if !selector.is_included(&descriptor.id, descriptor.level) {
            debug!(id = %descriptor.id, level = descriptor.level, "check not selected");
            continue;
        }
        scheduler.dispatch(entry.clone(), context.clone()).await;
    }

    run.set_stage(RunStage::Running);
    let dispatched = scheduler.join().await;
    run.set_stage(RunStage::Finished);

    if let Some(monitor) = monitor {
        monitor
            .await
            .map_err(|e| AuditError::Engine(format!("progress monitor failed: {}", e)))?;
    }

    let results = sink.close().await?;
    debug!(dispatched, rows = results.len(), "run complete");

    Ok(RunReport::new(
        config.target.clone(),
        registry.sections().to_vec(),
        results,
        stopwatch.elapsed_ms(),
    ))
}
