//! Live progress line.
//!
//! The monitor is a ticker task that only reads the shared [`RunContext`].
//! Each tick overwrites one status line; once every dispatched unit has
//! finished and dispatch itself is over, it writes a settled line and exits.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::context::{CounterSnapshot, RunContext, RunStage};
use crate::engine::timing::format_elapsed;

/// Default refresh interval
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Render one status line, e.g. `[00:03] / 7 of 10 completed`.
pub fn status_line(elapsed: Duration, indicator: char, snapshot: CounterSnapshot) -> String {
    format!(
        "[{}] {} {} of {} completed",
        format_elapsed(elapsed),
        indicator,
        snapshot.finished,
        snapshot.started
    )
}

pub struct ProgressMonitor {
    run: Arc<RunContext>,
    refresh: Duration,
}

impl ProgressMonitor {
    pub fn new(run: Arc<RunContext>) -> Self {
        ProgressMonitor {
            run,
            refresh: REFRESH_INTERVAL,
        }
    }

    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }

    /// Start drawing on `out`. The task resolves to the counters it saw on
    /// its last tick.
    pub fn spawn<W>(self, mut out: W) -> JoinHandle<CounterSnapshot>
    where
        W: Write + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.refresh);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut frame = 0usize;

            loop {
                ticker.tick().await;

                // Stage before counters: a unit is counted as started before
                // the stage leaves Loading.
                let stage = self.run.stage();
                let snapshot = self.run.counters.snapshot();
                let elapsed = self.run.started_at().elapsed();

                if stage != RunStage::Loading && snapshot.running() == 0 {
                    let _ = writeln!(
                        out,
                        "{}{}",
                        CLEAR_LINE,
                        status_line(elapsed, '*', snapshot)
                    );
                    let _ = out.flush();
                    return snapshot;
                }

                let _ = write!(
                    out,
                    "{}{}",
                    CLEAR_LINE,
                    status_line(elapsed, SPINNER[frame % SPINNER.len()], snapshot)
                );
                let _ = out.flush();
                frame += 1;
            }
        })
    }
}
