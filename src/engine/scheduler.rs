//! Check dispatch and execution.
//!
//! Every selected check becomes one unit of work. In the default concurrent
//! mode a unit is a tokio task holding a semaphore permit for its whole
//! lifetime, so at most `max_concurrency` units run at once and dispatch
//! waits for a free slot. The check body itself runs on the blocking pool.
//!
//! # Graceful Degradation
//!
//! - Check returns an error: recorded as an `Error` row
//! - Check panics: the blocking task's `JoinError` is recorded as an `Error` row
//! - Skipped checks: dispatched and counted, never evaluated
//!
//! A failing unit never affects its siblings, and every dispatched unit
//! appends exactly one row before it is counted as finished.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use crate::checks::registry::RegisteredCheck;
use crate::checks::CheckContext;
use crate::engine::context::{RunContext, UnitGuard};
use crate::engine::result::{SinkWriter, TestResult};
use crate::engine::timing::Stopwatch;
use crate::{CheckDescriptor, Outcome, Scoring};

/// Maximum number of units running at once unless configured otherwise
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// How dispatched units are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Units run concurrently, bounded by the admission semaphore
    #[default]
    Concurrent,
    /// One unit at a time with trace logging of each unit
    Trace,
    /// One unit at a time, pausing before each check
    Step,
}

impl ExecutionMode {
    pub fn is_sequential(&self) -> bool {
        !matches!(self, ExecutionMode::Concurrent)
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub max_concurrency: usize,
    pub mode: ExecutionMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            mode: ExecutionMode::Concurrent,
        }
    }
}

/// Called before each check in step mode. Runs on the blocking pool.
pub type StepHook = Arc<dyn Fn(&CheckDescriptor) + Send + Sync>;

/// Pause on the terminal until the operator presses Enter.
fn prompt_on_terminal(descriptor: &CheckDescriptor) {
    let mut stderr = std::io::stderr();
    let _ = write!(
        stderr,
        "next: {} {} [press Enter to run] ",
        descriptor.id, descriptor.description
    );
    let _ = stderr.flush();

    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        debug!(error = %e, "could not read step confirmation");
    }
}

/// Bounded-concurrency check dispatcher with a join barrier.
pub struct Scheduler {
    run: Arc<RunContext>,
    config: SchedulerConfig,
    writer: SinkWriter,
    slots: Arc<Semaphore>,
    units: JoinSet<()>,
    step_hook: StepHook,
    dispatched: usize,
}

impl Scheduler {
    pub fn new(run: Arc<RunContext>, config: SchedulerConfig, writer: SinkWriter) -> Self {
        let permits = config.max_concurrency.max(1);
        Scheduler {
            run,
            config,
            writer,
            slots: Arc::new(Semaphore::new(permits)),
            units: JoinSet::new(),
            step_hook: Arc::new(prompt_on_terminal),
            dispatched: 0,
        }
    }

    /// Replace the step-mode pause.
    pub fn with_step_hook(mut self, hook: StepHook) -> Self {
        self.step_hook = hook;
        self
    }

    /// Number of units dispatched so far
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Dispatch one check.
    ///
    /// In concurrent mode this returns once the unit has a slot and has been
    /// spawned. In the sequential modes it returns after the unit completed.
    pub async fn dispatch(&mut self, entry: Arc<RegisteredCheck>, context: Arc<CheckContext>) {
        self.dispatched += 1;
        debug!(id = %entry.descriptor().id, mode = ?self.config.mode, "dispatching check");

        match self.config.mode {
            ExecutionMode::Concurrent => {
                let permit = match self.slots.clone().acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        warn!(error = %e, "admission semaphore closed; running unbounded");
                        None
                    }
                };
                let guard = self.run.enter_unit();
                let writer = self.writer.clone();
                self.units.spawn(async move {
                    run_unit(entry, context, writer, guard).await;
                    drop(permit);
                });
            }
            ExecutionMode::Trace => {
                let guard = self.run.enter_unit();
                run_unit(entry, context, self.writer.clone(), guard).await;
            }
            ExecutionMode::Step => {
                let hook = self.step_hook.clone();
                let descriptor = entry.descriptor().clone();
                if let Err(e) = tokio::task::spawn_blocking(move || hook(&descriptor)).await {
                    warn!(error = %e, "step prompt failed");
                }
                let guard = self.run.enter_unit();
                run_unit(entry, context, self.writer.clone(), guard).await;
            }
        }
    }

    /// Join barrier: wait for every dispatched unit. Returns the number of
    /// units dispatched.
    pub async fn join(mut self) -> usize {
        while let Some(joined) = self.units.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "unit task aborted");
            }
        }
        self.dispatched
    }
}

async fn run_unit(
    entry: Arc<RegisteredCheck>,
    context: Arc<CheckContext>,
    writer: SinkWriter,
    guard: UnitGuard,
) {
    let descriptor = entry.descriptor();
    trace!(id = %descriptor.id, "unit started");

    let row = if descriptor.scoring == Scoring::Skipped {
        TestResult::not_evaluated(descriptor)
    } else {
        let stopwatch = Stopwatch::start();
        let check = entry.clone();
        let outcome = match tokio::task::spawn_blocking(move || check.evaluate(&context)).await {
            Ok(Ok(verdict)) => Outcome::from(verdict),
            // Recorded in the row; kept below the default warn level.
            Ok(Err(e)) => {
                debug!(id = %descriptor.id, error = %e, "check could not be evaluated");
                Outcome::Error
            }
            Err(e) => {
                warn!(id = %descriptor.id, error = %e, "check panicked");
                Outcome::Error
            }
        };
        TestResult::new(descriptor, outcome, stopwatch.elapsed_ms())
    };

    trace!(id = %descriptor.id, result = %row.result, ms = row.duration_ms, "unit finished");
    writer.append(row);
    drop(guard);
}
