//! Full run integration tests.
//!
//! Drives `run_audit` end to end: selection, bounded concurrency, the join
//! barrier and result collection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cisbench::checks::default_registry;
use cisbench::{
    run_audit, AuditConfig, AuditError, CheckContext, CheckDescriptor, CheckRegistry,
    ExecutionMode, Outcome, Scoring, SelectionCriteria, TargetSettings, TestResult, Verdict,
};

use crate::mocks::MockFacts;

fn quiet_config() -> AuditConfig {
    AuditConfig {
        show_progress: false,
        lower_priority: false,
        color: false,
        ..Default::default()
    }
}

fn config_with(criteria: SelectionCriteria) -> AuditConfig {
    AuditConfig {
        criteria,
        ..quiet_config()
    }
}

fn ids(results: &[TestResult]) -> Vec<String> {
    let mut ids: Vec<String> = results.iter().map(|r| r.id.clone()).collect();
    ids.sort();
    ids
}

fn row<'a>(results: &'a [TestResult], id: &str) -> &'a TestResult {
    results
        .iter()
        .find(|r| r.id == id)
        .unwrap_or_else(|| panic!("no row for {}", id))
}

/// Tracks how many checks are evaluating at the same moment.
#[derive(Default)]
struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Flat registry of `count` checks that each hold a slot for `hold`.
fn gauged_registry(count: usize, hold: Duration, gauge: &Arc<Gauge>) -> CheckRegistry {
    let mut registry = CheckRegistry::new();
    registry.section("1", "Synthetic").unwrap();
    for n in 1..=count {
        let gauge = gauge.clone();
        registry
            .register(
                CheckDescriptor::new(format!("1.{}", n), 1, Scoring::Scored, "synthetic check"),
                move |_ctx: &CheckContext| -> Result<Verdict, AuditError> {
                    gauge.enter();
                    std::thread::sleep(hold);
                    gauge.exit();
                    Ok(Verdict::Pass)
                },
            )
            .unwrap();
    }
    registry
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hardened_host_passes() {
    let registry = default_registry().unwrap();
    let report = run_audit(&quiet_config(), &registry, Arc::new(MockFacts::hardened()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), registry.len());
    assert!(!report.has_scored_failures());

    let summary = report.summary();
    assert_eq!(summary.total as usize, registry.len());
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.passed, summary.run);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_misconfigured_host_fails() {
    let registry = default_registry().unwrap();
    let report = run_audit(
        &quiet_config(),
        &registry,
        Arc::new(MockFacts::misconfigured()),
    )
    .await
    .unwrap();

    assert!(report.has_scored_failures());
    assert_eq!(row(&report.results, "1.2").result, Outcome::Pass);
    assert_eq!(row(&report.results, "1.3").result, Outcome::Fail);
    assert_eq!(row(&report.results, "2.1").result, Outcome::Fail);
    assert_eq!(row(&report.results, "4.1").result, Outcome::Fail);
    assert_eq!(row(&report.results, "4.2").result, Outcome::Fail);
    // log_destination is missing from the configuration
    assert_eq!(row(&report.results, "3.1.1").result, Outcome::Fail);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_absent_server_reports_errors() {
    let registry = default_registry().unwrap();
    let report = run_audit(
        &quiet_config(),
        &registry,
        Arc::new(MockFacts::hardened().without_processes()),
    )
    .await
    .unwrap();

    // Every check still produces a row
    assert_eq!(report.results.len(), registry.len());
    assert_eq!(row(&report.results, "1.2").result, Outcome::Error);
    assert_eq!(row(&report.results, "1.3").result, Outcome::Error);
    assert_eq!(row(&report.results, "2.1").result, Outcome::Pass);
    assert!(report.has_scored_failures());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unreadable_process_table() {
    let registry = default_registry().unwrap();
    let criteria = SelectionCriteria::new(0, ["1"], Vec::<String>::new());
    let report = run_audit(
        &config_with(criteria),
        &registry,
        Arc::new(MockFacts::hardened().with_process_table_error()),
    )
    .await
    .unwrap();

    assert_eq!(ids(&report.results), vec!["1.1", "1.2", "1.3", "1.4"]);
    assert_eq!(row(&report.results, "1.1").result, Outcome::NotEvaluated);
    assert_eq!(row(&report.results, "1.2").result, Outcome::Error);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_level_filter() {
    let registry = default_registry().unwrap();
    let criteria = SelectionCriteria::new(1, Vec::<String>::new(), Vec::<String>::new());
    let report = run_audit(
        &config_with(criteria),
        &registry,
        Arc::new(MockFacts::hardened()),
    )
    .await
    .unwrap();

    assert!(report.results.iter().all(|r| r.level == 1));
    let selected = ids(&report.results);
    assert!(selected.contains(&"3.1.1".to_string()));
    assert!(!selected.contains(&"3.1.4".to_string()));
    assert!(!selected.contains(&"3.2".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_include_with_exclude() {
    let registry = default_registry().unwrap();
    let criteria = SelectionCriteria::new(0, ["4.1"], ["4.1.1"]);
    let report = run_audit(
        &config_with(criteria),
        &registry,
        Arc::new(MockFacts::hardened()),
    )
    .await
    .unwrap();

    assert_eq!(ids(&report.results), vec!["4.1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exclude_drops_descendants() {
    let registry = default_registry().unwrap();
    let criteria = SelectionCriteria::new(0, Vec::<String>::new(), ["3"]);
    let report = run_audit(
        &config_with(criteria),
        &registry,
        Arc::new(MockFacts::hardened()),
    )
    .await
    .unwrap();

    assert!(report.results.iter().all(|r| !r.id.starts_with("3.")));
    assert_eq!(report.results.len(), registry.len() - 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_nothing_selected() {
    let registry = default_registry().unwrap();
    let criteria = SelectionCriteria::new(0, ["9"], Vec::<String>::new());
    let report = run_audit(
        &config_with(criteria),
        &registry,
        Arc::new(MockFacts::hardened()),
    )
    .await
    .unwrap();

    assert!(report.results.is_empty());
    assert!(!report.has_scored_failures());
    assert_eq!(report.summary().total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_is_bounded() {
    let gauge = Arc::new(Gauge::default());
    let registry = gauged_registry(25, Duration::from_millis(20), &gauge);

    let report = run_audit(&quiet_config(), &registry, Arc::new(MockFacts::empty()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 25);
    assert_eq!(gauge.calls.load(Ordering::SeqCst), 25);
    assert_eq!(gauge.active.load(Ordering::SeqCst), 0);
    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak <= 10, "peak concurrency {} exceeds limit", peak);
    assert!(peak >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_custom_concurrency_limit() {
    let gauge = Arc::new(Gauge::default());
    let registry = gauged_registry(12, Duration::from_millis(10), &gauge);
    let config = AuditConfig {
        max_concurrency: 3,
        ..quiet_config()
    };

    let report = run_audit(&config, &registry, Arc::new(MockFacts::empty()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 12);
    assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_trace_mode_runs_one_at_a_time() {
    let gauge = Arc::new(Gauge::default());
    let registry = gauged_registry(6, Duration::from_millis(5), &gauge);
    let config = AuditConfig {
        mode: ExecutionMode::Trace,
        ..quiet_config()
    };

    let report = run_audit(&config, &registry, Arc::new(MockFacts::empty()))
        .await
        .unwrap();

    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    let order: Vec<&str> = report.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(order, vec!["1.1", "1.2", "1.3", "1.4", "1.5", "1.6"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_progress_monitor_does_not_change_results() {
    let gauge = Arc::new(Gauge::default());
    let registry = gauged_registry(5, Duration::from_millis(5), &gauge);
    let config = AuditConfig {
        show_progress: true,
        ..quiet_config()
    };

    let report = run_audit(&config, &registry, Arc::new(MockFacts::empty()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 5);
    assert!(report.results.iter().all(|r| r.result == Outcome::Pass));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panicking_check_becomes_error_row() {
    let mut registry = CheckRegistry::new();
    registry
        .register(
            CheckDescriptor::new("1", 0, Scoring::Scored, "panics"),
            |_ctx: &CheckContext| -> Result<Verdict, AuditError> { panic!("check exploded") },
        )
        .unwrap()
        .register(
            CheckDescriptor::new("2", 0, Scoring::NotScored, "fails"),
            |_ctx: &CheckContext| -> Result<Verdict, AuditError> { Ok(Verdict::Fail) },
        )
        .unwrap();

    let report = run_audit(&quiet_config(), &registry, Arc::new(MockFacts::empty()))
        .await
        .unwrap();

    assert_eq!(row(&report.results, "1").result, Outcome::Error);
    assert_eq!(row(&report.results, "2").result, Outcome::Fail);
    assert!(report.has_scored_failures());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_not_scored_failure_does_not_fail_run() {
    let mut registry = CheckRegistry::new();
    registry
        .register(
            CheckDescriptor::new("1", 0, Scoring::NotScored, "advisory"),
            |_ctx: &CheckContext| -> Result<Verdict, AuditError> { Ok(Verdict::Fail) },
        )
        .unwrap();

    let report = run_audit(&quiet_config(), &registry, Arc::new(MockFacts::empty()))
        .await
        .unwrap();

    assert_eq!(report.summary().failed, 1);
    assert!(!report.has_scored_failures());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_report_carries_target_and_sections() {
    let registry = default_registry().unwrap();
    let target = TargetSettings {
        user: "pgsql".to_string(),
        ..Default::default()
    };
    let config = AuditConfig {
        target: target.clone(),
        ..quiet_config()
    };

    let report = run_audit(&config, &registry, Arc::new(MockFacts::hardened()))
        .await
        .unwrap();

    assert_eq!(report.target, target);
    assert_eq!(report.sections.len(), registry.sections().len());
    assert!(!report.timestamp.is_empty());
    // "pgsql" does not exist on the mock host
    assert_eq!(row(&report.results, "1.4").result, Outcome::Error);
}
