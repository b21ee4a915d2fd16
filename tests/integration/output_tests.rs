//! Output formatting tests.
//!
//! Renders reports from real audit runs through the text, JSON and CSV
//! formatters.

use std::sync::Arc;

use cisbench::checks::default_registry;
use cisbench::cli::args::OutputFormat;
use cisbench::cli::output::{get_formatter, render_catalogue, CSV_HEADER};
use cisbench::{run_audit, AuditConfig, RunReport, SelectionCriteria};

use crate::mocks::MockFacts;

async fn audit(facts: MockFacts, criteria: SelectionCriteria) -> RunReport {
    let config = AuditConfig {
        criteria,
        show_progress: false,
        lower_priority: false,
        color: false,
        ..Default::default()
    };
    let registry = default_registry().unwrap();
    run_audit(&config, &registry, Arc::new(facts)).await.unwrap()
}

async fn full_audit(facts: MockFacts) -> RunReport {
    audit(facts, SelectionCriteria::default()).await
}

#[tokio::test]
async fn test_text_report_lists_every_section() {
    let report = full_audit(MockFacts::hardened()).await;
    let output = get_formatter(OutputFormat::Text, false).format(&report);

    assert!(output.contains("cisbench report"));
    assert!(output.contains("1 INSTALLATION AND PATCHES"));
    assert!(output.contains("2 DIRECTORY AND FILE PERMISSIONS"));
    assert!(output.contains("3 LOGGING AND AUDITING"));
    assert!(output.contains("3.1 Log Destination and Collection"));
    assert!(output.contains("4 CONNECTION AND LOGIN"));
    assert!(output.contains("Fail: 0  Error: 0"));
    assert!(!output.contains('\x1b'));
}

#[tokio::test]
async fn test_text_report_rows_in_id_order() {
    let report = full_audit(MockFacts::misconfigured()).await;
    let output = get_formatter(OutputFormat::Text, false).format(&report);

    let pos = |needle: &str| {
        output
            .lines()
            .position(|l| l.starts_with(needle))
            .unwrap_or_else(|| panic!("{} missing", needle))
    };
    assert!(pos("1.1 ") < pos("1.4 "));
    assert!(pos("2.4 ") < pos("3 LOGGING"));
    assert!(pos("3.1.5 ") < pos("3.2 "));
    assert!(pos("4.1 ") < pos("4.1.1 "));
    assert!(pos("4.1.1 ") < pos("4.2 "));
}

#[tokio::test]
async fn test_text_report_omits_unselected_sections() {
    let report = audit(
        MockFacts::hardened(),
        SelectionCriteria::new(0, ["4.2"], Vec::<String>::new()),
    )
    .await;
    let output = get_formatter(OutputFormat::Text, false).format(&report);

    assert!(output.contains("4 CONNECTION AND LOGIN"));
    assert!(!output.contains("INSTALLATION"));
    assert!(!output.contains("LOGGING"));
}

#[tokio::test]
async fn test_json_report_summary() {
    let report = full_audit(MockFacts::misconfigured()).await;
    let output = get_formatter(OutputFormat::Json, false).format(&report);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    let summary = report.summary();
    assert_eq!(value["summary"]["failed"], summary.failed);
    assert_eq!(value["summary"]["total"], report.results.len());
    assert_eq!(value["target"]["process_name"], "postgres");
    assert_eq!(value["results"].as_array().unwrap().len(), report.results.len());
    assert_eq!(value["results"][0]["id"], "1.1");
    assert_eq!(value["results"][0]["scoring"], "Skipped");
}

#[tokio::test]
async fn test_csv_report_one_record_per_row() {
    let report = full_audit(MockFacts::hardened()).await;
    let output = get_formatter(OutputFormat::Csv, false).format(&report);
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines.len(), report.results.len() + 1);
    assert!(lines[1].starts_with("1.1,"));
    assert!(lines.iter().skip(1).all(|l| l.split(',').count() >= 6));
    assert!(lines.iter().any(|l| l.starts_with("4.1.1,") && l.contains(",PASS,")));
}

#[tokio::test]
async fn test_csv_report_records_errors() {
    let report = full_audit(MockFacts::hardened().without_processes()).await;
    let output = get_formatter(OutputFormat::Csv, false).format(&report);

    let record = output
        .lines()
        .find(|l| l.starts_with("1.2,"))
        .unwrap();
    assert!(record.contains(",Scored,1,ERROR,"));
}

#[test]
fn test_catalogue_listing_covers_registry() {
    let registry = default_registry().unwrap();
    let listing = render_catalogue(&registry);

    for entry in registry.checks() {
        assert!(listing.contains(&entry.descriptor().description));
    }
    assert!(listing.contains("[L2 Skipped]"));
    assert!(listing.ends_with(&format!("\n{} checks\n", registry.len())));
}
