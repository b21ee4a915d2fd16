//! CLI integration tests.
//!
//! Parses command lines the way `main` does and resolves them against
//! settings files into an `AuditConfig`.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use cisbench::cli::args::{Cli, Command, OutputFormat};
use cisbench::config::Settings;
use cisbench::{AuditConfig, AuditError, ExecutionMode, Selector};

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["cisbench"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn resolve(args: &[&str], settings: &str) -> Result<AuditConfig, AuditError> {
    let cli = parse(args);
    let settings = Settings::parse(settings)?;
    AuditConfig::resolve(&cli.check, &settings)
}

#[test]
fn test_no_arguments_runs_check() {
    let cli = parse(&[]);
    assert_eq!(cli.command(), Command::Check);
    assert_eq!(cli.check.format, OutputFormat::Text);
}

#[test]
fn test_help_and_version_are_not_failures() {
    let err = Cli::try_parse_from(["cisbench", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

    let err = Cli::try_parse_from(["cisbench", "--version"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
}

#[test]
fn test_invalid_format_rejected() {
    assert!(Cli::try_parse_from(["cisbench", "--format", "xml"]).is_err());
}

#[test]
fn test_defaults_resolve() {
    let config = resolve(&[], "").unwrap();
    assert_eq!(config.max_concurrency, 10);
    assert_eq!(config.mode, ExecutionMode::Concurrent);
    assert_eq!(config.criteria.level_filter, 0);
    assert!(config.criteria.include.is_empty());
    assert!(config.criteria.exclude.is_empty());
    assert!(config.show_progress);
    assert!(config.lower_priority);
    assert_eq!(config.target.process_name, "postgres");
}

#[test]
fn test_single_level_becomes_filter() {
    let config = resolve(&["-l", "2"], "").unwrap();
    assert_eq!(config.criteria.level_filter, 2);
}

#[test]
fn test_both_levels_mean_no_filter() {
    let config = resolve(&["-l", "1", "-l", "2"], "").unwrap();
    assert_eq!(config.criteria.level_filter, 0);
}

#[test]
fn test_space_delimited_ids_split() {
    let config = resolve(&["-i", "1.1 2.1", "-e", "4.1.1"], "").unwrap();
    let include: Vec<&str> = config.criteria.include.iter().map(String::as_str).collect();
    assert_eq!(include, vec!["1.1", "2.1"]);
    assert!(config.criteria.exclude.contains("4.1.1"));
}

#[test]
fn test_resolved_criteria_drive_selector() {
    let config = resolve(&["-i", "4.1", "-e", "4.1.1"], "").unwrap();
    let selector = Selector::new(&config.criteria);
    assert!(selector.is_included("4", 0));
    assert!(selector.is_included("4.1", 1));
    assert!(!selector.is_included("4.1.1", 2));
    assert!(!selector.is_included("4.2", 1));
}

#[test]
fn test_execution_mode_flags() {
    let trace = resolve(&["-v"], "").unwrap();
    assert_eq!(trace.mode, ExecutionMode::Trace);

    let step = resolve(&["check", "--debug"], "").unwrap();
    assert_eq!(step.mode, ExecutionMode::Step);
}

#[test]
fn test_settings_supply_defaults() {
    let settings = r#"
[target]
user = "pgsql"
data_dir = "/srv/pg/data"

[run]
level = 1
exclude = ["3.2"]
max_concurrency = 4
progress = false
nice = false
"#;
    let config = resolve(&[], settings).unwrap();
    assert_eq!(config.target.user, "pgsql");
    assert_eq!(config.target.data_dir, PathBuf::from("/srv/pg/data"));
    assert_eq!(config.criteria.level_filter, 1);
    assert!(config.criteria.exclude.contains("3.2"));
    assert_eq!(config.max_concurrency, 4);
    assert!(!config.show_progress);
    assert!(!config.lower_priority);
}

#[test]
fn test_command_line_overrides_settings() {
    let settings = r#"
[target]
user = "pgsql"

[run]
level = 1
max_concurrency = 4
nice = false
"#;
    let config = resolve(&["-u", "dbadmin", "-l", "2", "-j", "2", "--nice"], settings).unwrap();
    assert_eq!(config.target.user, "dbadmin");
    assert_eq!(config.criteria.level_filter, 2);
    assert_eq!(config.max_concurrency, 2);
    assert!(config.lower_priority);
}

#[test]
fn test_zero_concurrency_rejected() {
    assert!(matches!(
        resolve(&["-j", "0"], ""),
        Err(AuditError::Settings(_))
    ));
}

#[test]
fn test_invalid_settings_level_rejected() {
    assert!(matches!(
        resolve(&[], "[run]\nlevel = 5\n"),
        Err(AuditError::Settings(_))
    ));
}

#[test]
fn test_unknown_settings_key_rejected() {
    assert!(Settings::parse("[run]\nfail_fast = true\n").is_err());
}

#[test]
fn test_settings_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[target]\nprocess_name = \"postmaster\"").unwrap();

    let settings = Settings::load(Some(file.path())).unwrap();
    let cli = parse(&[]);
    let config = AuditConfig::resolve(&cli.check, &settings).unwrap();
    assert_eq!(config.target.process_name, "postmaster");
}

#[test]
fn test_missing_settings_file_is_io_error() {
    let result = Settings::load(Some(std::path::Path::new("/nonexistent/cisbench.toml")));
    assert!(matches!(result, Err(AuditError::Io { .. })));
}
