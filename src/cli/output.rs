//! Output formatting for cisbench.
//!
//! Provides text, JSON and comma-delimited record formatters, plus the
//! catalogue listing used by `cisbench list`.
//!
//! # Graceful Degradation
//!
//! - Non-TTY output or `--no-color`: plain aligned text, no escape codes
//! - Empty reports: valid output with zero rows
//! - Sections without any selected check: not printed
//!
//! All formatters produce valid output for any RunReport input.
//! No function in this module will panic.

use std::cmp::Ordering;

use colored::Colorize;
use serde::Serialize;

use crate::checks::{CheckRegistry, SectionHeader, TargetSettings};
use crate::cli::args::OutputFormat;
use crate::engine::id;
use crate::engine::result::{ResultSummary, RunReport, TestResult};
use crate::engine::timing::format_elapsed;
use crate::{Outcome, Scoring};

const RULE: &str =
    "--------------------------------------------------------------------------------";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a run report into a string
    fn format(&self, report: &RunReport) -> String;
}

/// Result rows in hierarchical id order
pub fn sorted_rows(report: &RunReport) -> Vec<&TestResult> {
    let mut rows: Vec<&TestResult> = report.results.iter().collect();
    rows.sort_by(|a, b| id::compare(&a.id, &b.id));
    rows
}

enum Line<'a> {
    Section(&'a SectionHeader),
    Row(&'a TestResult),
}

impl Line<'_> {
    fn id(&self) -> &str {
        match self {
            Line::Section(header) => &header.id,
            Line::Row(row) => &row.id,
        }
    }
}

/// Merge section headers into the rows. A header is kept only when at
/// least one row belongs to it.
fn layout<'a>(sections: &'a [SectionHeader], rows: &[&'a TestResult]) -> Vec<Line<'a>> {
    let mut lines: Vec<Line<'a>> = sections
        .iter()
        .filter(|header| rows.iter().any(|row| id::is_ancestor(&header.id, &row.id)))
        .map(Line::Section)
        .chain(rows.iter().copied().map(Line::Row))
        .collect();

    // A header sorts before a row with the same id.
    lines.sort_by(|a, b| {
        id::compare(a.id(), b.id()).then_with(|| match (a, b) {
            (Line::Section(_), Line::Row(_)) => Ordering::Less,
            (Line::Row(_), Line::Section(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    });
    lines
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool) -> Self {
        TerminalFormatter { color }
    }

    fn paint_header(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_row(&self, row: &TestResult, text: String) -> String {
        if !self.color {
            return text;
        }
        if row.scoring == Scoring::Skipped {
            return text.dimmed().to_string();
        }
        match row.result {
            Outcome::Pass => text.green().to_string(),
            Outcome::Fail => text.red().to_string(),
            Outcome::Error => text.yellow().to_string(),
            Outcome::NotEvaluated => text.dimmed().to_string(),
        }
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &RunReport) -> String {
        let mut output = String::new();

        output.push_str(RULE);
        output.push('\n');
        output.push_str("cisbench report\n");
        output.push_str(&format!("Host: {}\n", report.hostname));
        output.push_str(&format!("Target: {}\n", describe_target(&report.target)));
        output.push_str(&format!("Timestamp: {}\n", report.timestamp));
        output.push_str(RULE);
        output.push('\n');

        let rows = sorted_rows(report);
        let id_width = rows
            .iter()
            .map(|r| r.id.len())
            .chain(std::iter::once("ID".len()))
            .max()
            .unwrap_or(2);
        let desc_width = rows
            .iter()
            .map(|r| r.description.chars().count())
            .chain(std::iter::once("DESCRIPTION".len()))
            .max()
            .unwrap_or(11);

        output.push_str(&self.paint_header(&format!(
            "{:<id$}  {:<desc$}  {:<10}  {:<5}  {:<6}  {}",
            "ID",
            "DESCRIPTION",
            "SCORING",
            "LEVEL",
            "RESULT",
            "TIME",
            id = id_width,
            desc = desc_width
        )));
        output.push('\n');

        for line in layout(&report.sections, &rows) {
            match line {
                Line::Section(header) => {
                    if id::depth(&header.id) == 1 {
                        output.push('\n');
                        output.push_str(&self.paint_header(&format!(
                            "{} {}",
                            header.id,
                            header.title.to_uppercase()
                        )));
                    } else {
                        output.push_str(
                            &self.paint_header(&format!("{} {}", header.id, header.title)),
                        );
                    }
                    output.push('\n');
                }
                Line::Row(row) => {
                    let text = format!(
                        "{:<id$}  {:<desc$}  {:<10}  {:<5}  {:<6}  {}ms",
                        row.id,
                        row.description,
                        row.scoring.to_string(),
                        row.level,
                        row.result.to_string(),
                        row.duration_ms,
                        id = id_width,
                        desc = desc_width
                    );
                    output.push_str(&self.paint_row(row, text));
                    output.push('\n');
                }
            }
        }

        let summary = report.summary();
        output.push('\n');
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format_summary(&summary));
        output.push_str(RULE);

        output
    }
}

fn describe_target(target: &TargetSettings) -> String {
    format!(
        "{} as {} ({})",
        target.process_name,
        target.user,
        target.config_file.display()
    )
}

fn format_summary(summary: &ResultSummary) -> String {
    format!(
        "Scored: {}  Not Scored: {}  Skipped: {}\n\
         Run: {}  Pass: {}  Fail: {}  Error: {}\n\
         Total time: {}\n",
        summary.scored,
        summary.not_scored,
        summary.skipped,
        summary.run,
        summary.passed,
        summary.failed,
        summary.errors,
        format_elapsed(std::time::Duration::from_millis(summary.total_duration_ms))
    )
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    timestamp: &'a str,
    hostname: &'a str,
    target: &'a TargetSettings,
    total_duration_ms: u64,
    summary: ResultSummary,
    results: Vec<&'a TestResult>,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &RunReport) -> String {
        let document = JsonReport {
            timestamp: &report.timestamp,
            hostname: &report.hostname,
            target: &report.target,
            total_duration_ms: report.total_duration_ms,
            summary: report.summary(),
            results: sorted_rows(report),
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

/// Comma-delimited record formatter
pub struct CsvFormatter;

pub const CSV_HEADER: &str = "id,description,scoring,level,result,duration_ms";

impl OutputFormatter for CsvFormatter {
    fn format(&self, report: &RunReport) -> String {
        let mut output = String::from(CSV_HEADER);
        for row in sorted_rows(report) {
            output.push('\n');
            output.push_str(&row.to_record());
        }
        output
    }
}

/// Get a formatter based on the output format
pub fn get_formatter(format: OutputFormat, color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

/// Colors only when wanted and writing to a terminal
pub fn should_colorize(color_wanted: bool, is_tty: bool) -> bool {
    color_wanted && is_tty
}

/// Catalogue listing for `cisbench list`
pub fn render_catalogue(registry: &CheckRegistry) -> String {
    let mut entries: Vec<(String, String)> = registry
        .sections()
        .iter()
        .map(|s| (s.id.clone(), s.title.clone()))
        .chain(registry.checks().iter().map(|c| {
            let d = c.descriptor();
            (
                d.id.clone(),
                format!("[L{} {}] {}", d.level, d.scoring, d.description),
            )
        }))
        .collect();
    entries.sort_by(|a, b| id::compare(&a.0, &b.0));

    let width = entries.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    let mut output = String::new();
    for (entry_id, text) in entries {
        output.push_str(&format!("{:<width$}  {}\n", entry_id, text, width = width));
    }
    output.push_str(&format!("\n{} checks\n", registry.len()));
    output
}
