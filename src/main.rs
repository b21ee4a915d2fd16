//! cisbench CLI entry point
//!
//! Audits a running PostgreSQL server against a CIS-style benchmark.
//!
//! Exit codes: 0 when every scored check passed, 1 when a scored check
//! failed or could not be evaluated, 3 on a runtime error.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, warn};

use cisbench::checks;
use cisbench::cli::args::{CheckArgs, Cli, Command};
use cisbench::cli::output::{get_formatter, render_catalogue, should_colorize};
use cisbench::config::Settings;
use cisbench::platform::linux::{self, LinuxFacts};
use cisbench::platform::SystemFacts;
use cisbench::telemetry::init_tracing;
use cisbench::version::BuildInfo;
use cisbench::{run_audit, AuditConfig};

/// Niceness added to the process when priority reduction is on
const NICE_INCREMENT: i32 = 10;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 3,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_tracing(cli.check.log_level());

    match cli.command() {
        Command::Version => {
            println!("{}", BuildInfo::current());
            ExitCode::SUCCESS
        }
        Command::List => match checks::default_registry() {
            Ok(registry) => {
                print!("{}", render_catalogue(&registry));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(3)
            }
        },
        Command::Check => match run_checks(&cli.check) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(3)
            }
        },
    }
}

fn run_checks(args: &CheckArgs) -> Result<ExitCode> {
    let settings = Settings::load(args.settings.as_deref()).context("loading settings")?;
    let mut config = AuditConfig::resolve(args, &settings)?;
    if !std::io::stderr().is_terminal() {
        config.show_progress = false;
    }
    debug!(?config, "resolved configuration");

    if config.lower_priority {
        if let Err(e) = linux::lower_priority(NICE_INCREMENT) {
            warn!(error = %e, "could not lower CPU priority");
        }
    }

    let registry = checks::default_registry().context("building the check catalogue")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting the async runtime")?;

    let facts: Arc<dyn SystemFacts> = Arc::new(LinuxFacts::new());
    let report = runtime.block_on(run_audit(&config, &registry, facts))?;

    let color = should_colorize(config.color, std::io::stdout().is_terminal());
    colored::control::set_override(color);
    let formatter = get_formatter(args.format, color);
    println!("{}", formatter.format(&report));

    Ok(if report.has_scored_failures() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
