//! Result collection and reporting.
//!
//! Every executed check appends exactly one [`TestResult`] to the run's
//! [`ResultSink`]. Writers only append; the rows are read back once, after
//! the scheduler's join barrier, to build a [`RunReport`].

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::checks::{SectionHeader, TargetSettings};
use crate::{AuditError, CheckDescriptor, Outcome, Scoring};

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub description: String,
    pub scoring: Scoring,
    pub level: u8,
    pub result: Outcome,
    pub duration_ms: u64,
}

impl TestResult {
    pub fn new(descriptor: &CheckDescriptor, result: Outcome, duration_ms: u64) -> Self {
        TestResult {
            id: descriptor.id.clone(),
            description: descriptor.description.clone(),
            scoring: descriptor.scoring,
            level: descriptor.level,
            result,
            duration_ms,
        }
    }

    /// Row for a check that was dispatched but deliberately not evaluated
    pub fn not_evaluated(descriptor: &CheckDescriptor) -> Self {
        Self::new(descriptor, Outcome::NotEvaluated, 0)
    }

    /// Comma-delimited record: id, description, scoring, level, result,
    /// duration. Fields holding a comma or quote are quoted.
    pub fn to_record(&self) -> String {
        [
            record_field(&self.id),
            record_field(&self.description),
            record_field(&self.scoring.to_string()),
            self.level.to_string(),
            self.result.to_string(),
            self.duration_ms.to_string(),
        ]
        .join(",")
    }
}

fn record_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Append handle given to every unit of work.
#[derive(Debug, Clone)]
pub struct SinkWriter {
    tx: mpsc::UnboundedSender<TestResult>,
}

impl SinkWriter {
    pub fn append(&self, row: TestResult) {
        if let Err(rejected) = self.tx.send(row) {
            warn!(id = %rejected.0.id, "result sink closed; row dropped");
        }
    }
}

/// Single aggregation point for result rows.
///
/// Rows travel over a channel to one aggregator task, so writers never
/// observe or modify each other's rows.
#[derive(Debug)]
pub struct ResultSink {
    aggregator: JoinHandle<Vec<TestResult>>,
}

impl ResultSink {
    /// Start the aggregator. Must be called from within a tokio runtime.
    pub fn open() -> (ResultSink, SinkWriter) {
        let (tx, mut rx) = mpsc::unbounded_channel::<TestResult>();
        let aggregator = tokio::spawn(async move {
            let mut rows = Vec::new();
            while let Some(row) = rx.recv().await {
                rows.push(row);
            }
            rows
        });
        (ResultSink { aggregator }, SinkWriter { tx })
    }

    /// Wait for every writer to be dropped and return the rows in arrival
    /// order.
    pub async fn close(self) -> Result<Vec<TestResult>, AuditError> {
        self.aggregator
            .await
            .map_err(|e| AuditError::Engine(format!("result aggregator failed: {}", e)))
    }
}

/// Result summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    /// Rows classified Scored
    pub scored: u32,
    /// Rows classified Not Scored
    pub not_scored: u32,
    /// Rows classified Skipped
    pub skipped: u32,
    /// All rows
    pub total: u32,
    /// Rows actually evaluated (total minus skipped)
    pub run: u32,
    pub passed: u32,
    pub failed: u32,
    pub errors: u32,
    pub total_duration_ms: u64,
}

impl ResultSummary {
    pub fn from_results(results: &[TestResult], total_duration_ms: u64) -> Self {
        let mut summary = ResultSummary {
            total_duration_ms,
            ..Default::default()
        };

        for row in results {
            summary.total += 1;

            match row.scoring {
                Scoring::Scored => summary.scored += 1,
                Scoring::NotScored => summary.not_scored += 1,
                Scoring::Skipped => summary.skipped += 1,
            }

            match row.result {
                Outcome::Pass => summary.passed += 1,
                Outcome::Fail => summary.failed += 1,
                Outcome::Error => summary.errors += 1,
                Outcome::NotEvaluated => {}
            }
        }

        summary.run = summary.total - summary.skipped;
        summary
    }
}

/// Audit report containing all result rows of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub hostname: String,
    pub target: TargetSettings,
    pub sections: Vec<SectionHeader>,
    pub results: Vec<TestResult>,
    pub total_duration_ms: u64,
}

impl RunReport {
    pub fn new(
        target: TargetSettings,
        sections: Vec<SectionHeader>,
        results: Vec<TestResult>,
        total_duration_ms: u64,
    ) -> Self {
        RunReport {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            hostname: crate::platform::linux::get_hostname()
                .unwrap_or_else(|_| "unknown".to_string()),
            target,
            sections,
            results,
            total_duration_ms,
        }
    }

    /// Calculate summary statistics
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results, self.total_duration_ms)
    }

    /// Whether any Scored row failed or could not be evaluated
    pub fn has_scored_failures(&self) -> bool {
        self.results.iter().any(|row| {
            row.scoring == Scoring::Scored && matches!(row.result, Outcome::Fail | Outcome::Error)
        })
    }
}
