//! Batch execution over a combination sequence.
//!
//! [`BatchController`] walks a window of the combination sequence,
//! calling the injected [`PanelDriver`] once per index and appending
//! each measured row to the caller's [`ResultTable`]. A cloneable
//! [`BatchHandle`] is the control surface: pause, resume, stop, and the
//! window configuration. Pause suspension is wakeup-driven through a
//! `watch` channel, never timed polling, so resume latency is a single
//! notification.

use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use gridsweep_core::{Combination, PlanDigest, ResultRow, ResultTable};

use crate::driver::{DriverResult, PanelDriver};
use crate::error::{BatchError, DriverError};

/// Execution state of the batch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

/// Contiguous sub-range of the combination sequence selected for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWindow {
    /// First combination index to execute.
    pub start_index: usize,

    /// Maximum number of combinations to execute. At least 1.
    pub max_runs: usize,
}

impl Default for BatchWindow {
    fn default() -> Self {
        Self {
            start_index: 0,
            max_runs: 200,
        }
    }
}

impl BatchWindow {
    pub fn new(start_index: usize, max_runs: usize) -> Self {
        Self {
            start_index,
            max_runs: max_runs.max(1),
        }
    }

    /// Effective index range against a concrete combination count.
    /// A start beyond the end yields an empty range, not an error.
    pub fn clamp(&self, combination_count: usize) -> Range<usize> {
        let start = self.start_index.min(combination_count);
        let end = combination_count.min(start.saturating_add(self.max_runs));
        start..end
    }
}

/// One failed step inside a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailure {
    pub index: usize,
    pub error: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique id for this run.
    pub run_id: String,

    /// Digest of the combination sequence the run was launched against.
    pub plan_digest: String,

    /// Number of combinations that produced a result row.
    pub executed: usize,

    /// Steps skipped after a driver failure.
    pub failures: Vec<StepFailure>,

    /// False when the run was stopped before the window was exhausted.
    pub completed: bool,

    /// Wall-clock duration.
    pub duration_ms: u64,
}

impl BatchReport {
    /// Number of steps that failed.
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

/// Orchestrates batch execution with a run/pause/resume/stop machine.
///
/// The controller owns no combination or result state; the sequence and
/// the table belong to the caller. Only the run state and the window
/// configuration are shared with the control surface.
pub struct BatchController {
    driver: Arc<dyn PanelDriver>,
    state: Arc<watch::Sender<RunState>>,
    window: Arc<Mutex<BatchWindow>>,
    step_timeout: Option<Duration>,
}

impl BatchController {
    pub fn new(driver: Arc<dyn PanelDriver>) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            driver,
            state: Arc::new(state),
            window: Arc::new(Mutex::new(BatchWindow::default())),
            step_timeout: None,
        }
    }

    /// Bound each apply/measure call. An overrun counts as a failed
    /// step; without a bound, a hung driver hangs the batch.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// Control surface for this controller. Cheap to clone and usable
    /// from any task.
    pub fn handle(&self) -> BatchHandle {
        BatchHandle {
            state: self.state.clone(),
            window: self.window.clone(),
        }
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Execute the configured window over `combos`, appending each
    /// measured row to `table`.
    ///
    /// The slice is borrowed for the whole run: the sequence a run
    /// executes is the snapshot it was started with, and parameter
    /// edits only affect later runs. An empty sequence is a no-op, not
    /// an error. A failed step is recorded and skipped; the loop
    /// continues with the next index so one bad measurement does not
    /// forfeit the rest of the window.
    pub async fn run(
        &self,
        combos: &[Combination],
        table: &mut ResultTable,
    ) -> Result<BatchReport, BatchError> {
        let started_at = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let plan_digest = PlanDigest::of(&combos)?;

        if combos.is_empty() {
            return Ok(BatchReport {
                run_id,
                plan_digest: plan_digest.to_string(),
                executed: 0,
                failures: Vec::new(),
                completed: true,
                duration_ms: 0,
            });
        }

        let started = self.state.send_if_modified(|s| {
            if *s == RunState::Idle {
                *s = RunState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(BatchError::AlreadyRunning);
        }

        let window = self.window.lock().unwrap().clamp(combos.len());
        info!(
            run_id = %run_id,
            plan = %plan_digest.short(),
            start = window.start,
            end = window.end,
            "starting batch"
        );

        let mut rx = self.state.subscribe();
        let mut executed = 0usize;
        let mut failures = Vec::new();
        let mut stopped = false;

        'steps: for index in window {
            // Control state is observed only at iteration boundaries; a
            // pause never consumes the index it interrupts and an
            // in-flight step always completes.
            loop {
                // copy the state out so the watch borrow is released
                // before any await below
                let current = *rx.borrow_and_update();
                match current {
                    RunState::Running => break,
                    RunState::Idle => {
                        stopped = true;
                        break 'steps;
                    }
                    RunState::Paused => {
                        info!(index, "batch paused");
                        if rx.changed().await.is_err() {
                            stopped = true;
                            break 'steps;
                        }
                    }
                }
            }

            match self.apply_step(&combos[index], index).await {
                Ok(row) => {
                    table.append(row);
                    executed += 1;
                }
                Err(err) => {
                    warn!(index, error = %err, "step failed, skipping index");
                    failures.push(StepFailure {
                        index,
                        error: err.to_string(),
                    });
                }
            }
        }

        self.state.send_replace(RunState::Idle);

        let duration_ms = started_at.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            executed,
            failed = failures.len(),
            stopped,
            duration_ms,
            "batch finished"
        );

        Ok(BatchReport {
            run_id,
            plan_digest: plan_digest.to_string(),
            executed,
            failures,
            completed: !stopped,
            duration_ms,
        })
    }

    async fn apply_step(&self, combo: &Combination, index: usize) -> DriverResult<ResultRow> {
        match self.step_timeout {
            Some(limit) => {
                tokio::time::timeout(limit, self.driver.apply_and_measure(combo, index))
                    .await
                    .map_err(|_| {
                        DriverError::MeasurementStalled(format!(
                            "step {index} exceeded the {}ms deadline",
                            limit.as_millis()
                        ))
                    })?
            }
            None => self.driver.apply_and_measure(combo, index).await,
        }
    }
}

/// Cloneable control surface over a controller.
///
/// Transitions are guarded: `pause` only applies to a running batch,
/// `resume` only to a paused one. Each method reports whether the
/// transition took effect.
#[derive(Clone)]
pub struct BatchHandle {
    state: Arc<watch::Sender<RunState>>,
    window: Arc<Mutex<BatchWindow>>,
}

impl BatchHandle {
    /// Running to Paused. The in-flight step finishes; the next index
    /// waits until resume.
    pub fn pause(&self) -> bool {
        self.state.send_if_modified(|s| {
            if *s == RunState::Running {
                *s = RunState::Paused;
                true
            } else {
                false
            }
        })
    }

    /// Paused to Running.
    pub fn resume(&self) -> bool {
        self.state.send_if_modified(|s| {
            if *s == RunState::Paused {
                *s = RunState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Any state to Idle. A running loop observes this at the next
    /// iteration boundary, so the step in flight still completes.
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|s| {
            if *s == RunState::Idle {
                false
            } else {
                *s = RunState::Idle;
                true
            }
        })
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Window configuration for subsequent runs.
    pub fn window(&self) -> BatchWindow {
        *self.window.lock().unwrap()
    }

    /// Reconfigure the window. A run in progress keeps the window it
    /// started with.
    pub fn set_window(&self, window: BatchWindow) {
        *self.window.lock().unwrap() = window;
    }
}
