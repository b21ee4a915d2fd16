//! Shared run state.
//!
//! A [`RunContext`] is created per run and handed to the scheduler, every
//! dispatched unit and the progress monitor. It holds the only mutable state
//! those components share: two monotonically increasing counters and the run
//! stage marker.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Phase of a run, advanced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunStage {
    /// Checks are still being dispatched
    Loading = 0,
    /// Everything is dispatched; waiting at the join barrier
    Running = 1,
    /// The join barrier has been passed
    Finished = 2,
}

impl RunStage {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunStage::Loading,
            1 => RunStage::Running,
            _ => RunStage::Finished,
        }
    }
}

/// Point-in-time view of the execution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub started: usize,
    pub finished: usize,
}

impl CounterSnapshot {
    /// Units started but not yet finished
    pub fn running(&self) -> usize {
        self.started.saturating_sub(self.finished)
    }
}

/// `started` and `finished` unit counts. Both only ever increase.
#[derive(Debug, Default)]
pub struct ExecutionCounters {
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl ExecutionCounters {
    pub fn record_start(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    /// Read both counters. `finished` is loaded first so the snapshot never
    /// shows more finished than started units.
    pub fn snapshot(&self) -> CounterSnapshot {
        let finished = self.finished.load(Ordering::SeqCst);
        let started = self.started.load(Ordering::SeqCst);
        CounterSnapshot { started, finished }
    }
}

/// Run-scoped state shared by all engine components.
#[derive(Debug)]
pub struct RunContext {
    pub counters: ExecutionCounters,
    stage: AtomicU8,
    started_at: Instant,
}

impl RunContext {
    pub fn new() -> Self {
        RunContext {
            counters: ExecutionCounters::default(),
            stage: AtomicU8::new(RunStage::Loading as u8),
            started_at: Instant::now(),
        }
    }

    pub fn stage(&self) -> RunStage {
        RunStage::from_u8(self.stage.load(Ordering::SeqCst))
    }

    pub fn set_stage(&self, stage: RunStage) {
        self.stage.store(stage as u8, Ordering::SeqCst);
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Count a unit as started. The returned guard counts it as finished
    /// when dropped, whether the unit completed or unwound.
    pub fn enter_unit(self: &Arc<Self>) -> UnitGuard {
        self.counters.record_start();
        UnitGuard { run: self.clone() }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one unit of work as in flight.
#[derive(Debug)]
pub struct UnitGuard {
    run: Arc<RunContext>,
}

impl Drop for UnitGuard {
    fn drop(&mut self) {
        self.run.counters.record_finish();
    }
}
