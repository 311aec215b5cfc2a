//! Integration tests for the batch controller with fake drivers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use gridsweep_batch::{
    BatchController, BatchError, BatchReport, BatchWindow, DriverError, DriverResult,
    PanelDriver, RunState, SimulatedPanel,
};
use gridsweep_core::{Combination, ResultRow, ResultTable};

fn combos(n: i64) -> Vec<Combination> {
    (0..n)
        .map(|i| BTreeMap::from([("length".to_string(), json!(i))]))
        .collect()
}

/// Driver that waits for an explicit permit before completing each step,
/// so tests decide exactly when a step finishes. `entered` records steps
/// the loop has started, `seen` records steps that completed; the gap
/// between the two is the in-flight step.
struct GatedPanel {
    gate: Semaphore,
    entered: Mutex<Vec<usize>>,
    seen: Mutex<Vec<usize>>,
}

impl GatedPanel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            entered: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    fn entered(&self) -> Vec<usize> {
        self.entered.lock().unwrap().clone()
    }

    fn seen(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PanelDriver for GatedPanel {
    async fn apply_and_measure(
        &self,
        combo: &Combination,
        index: usize,
    ) -> DriverResult<ResultRow> {
        self.entered.lock().unwrap().push(index);
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        self.seen.lock().unwrap().push(index);
        Ok(ResultRow::new(index, combo))
    }
}

/// Driver that fails on a fixed set of indices.
struct FailingPanel {
    fail_on: Vec<usize>,
}

#[async_trait]
impl PanelDriver for FailingPanel {
    async fn apply_and_measure(
        &self,
        combo: &Combination,
        index: usize,
    ) -> DriverResult<ResultRow> {
        if self.fail_on.contains(&index) {
            return Err(DriverError::ApplyRejected {
                selector: "#length".to_string(),
                reason: "value rejected".to_string(),
            });
        }
        Ok(ResultRow::new(index, combo))
    }
}

/// Driver that never completes.
struct StalledPanel;

#[async_trait]
impl PanelDriver for StalledPanel {
    async fn apply_and_measure(
        &self,
        _combo: &Combination,
        _index: usize,
    ) -> DriverResult<ResultRow> {
        std::future::pending().await
    }
}

fn spawn_run(
    controller: &Arc<BatchController>,
    cs: &[Combination],
) -> JoinHandle<(Result<BatchReport, BatchError>, ResultTable)> {
    let controller = controller.clone();
    let cs = cs.to_vec();
    tokio::spawn(async move {
        let mut table = ResultTable::new();
        let result = controller.run(&cs, &mut table).await;
        (result, table)
    })
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_window_executes_exact_indices() {
    let controller = BatchController::new(Arc::new(SimulatedPanel::new()));
    controller.handle().set_window(BatchWindow::new(3, 4));

    let cs = combos(10);
    let mut table = ResultTable::new();
    let report = controller.run(&cs, &mut table).await.expect("run failed");

    assert_eq!(report.executed, 4);
    assert!(report.completed);
    assert!(report.failures.is_empty());
    let indices: Vec<usize> = table.rows().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![3, 4, 5, 6]);
    assert_eq!(controller.state(), RunState::Idle);
}

#[tokio::test]
async fn test_start_index_beyond_count_is_a_noop() {
    let controller = BatchController::new(Arc::new(SimulatedPanel::new()));
    controller.handle().set_window(BatchWindow::new(50, 10));

    let cs = combos(10);
    let mut table = ResultTable::new();
    let report = controller.run(&cs, &mut table).await.expect("run failed");

    assert_eq!(report.executed, 0);
    assert!(report.completed);
    assert!(table.is_empty());
    assert_eq!(controller.state(), RunState::Idle);
}

#[tokio::test]
async fn test_empty_sequence_is_a_noop_not_an_error() {
    let controller = BatchController::new(Arc::new(SimulatedPanel::new()));
    let mut table = ResultTable::new();
    let report = controller.run(&[], &mut table).await.expect("run failed");

    assert_eq!(report.executed, 0);
    assert!(report.completed);
    assert_eq!(controller.state(), RunState::Idle);
}

#[tokio::test]
async fn test_second_start_is_rejected_while_running() {
    let driver = GatedPanel::new();
    let controller = Arc::new(BatchController::new(driver.clone()));
    let handle = controller.handle();
    handle.set_window(BatchWindow::new(0, 3));

    let cs = combos(3);
    let task = spawn_run(&controller, &cs);

    {
        let handle = handle.clone();
        wait_for(move || handle.state() == RunState::Running).await;
    }

    let mut table = ResultTable::new();
    let err = controller
        .run(&cs, &mut table)
        .await
        .expect_err("second run should be rejected");
    assert!(matches!(err, BatchError::AlreadyRunning));

    driver.release(3);
    let (result, _) = task.await.expect("task panicked");
    let report = result.expect("run failed");
    assert!(report.completed);
    assert_eq!(report.executed, 3);
}

#[tokio::test]
async fn test_pause_resume_preserves_the_pending_index() {
    let driver = GatedPanel::new();
    let controller = Arc::new(BatchController::new(driver.clone()));
    let handle = controller.handle();
    handle.set_window(BatchWindow::new(0, 5));

    let cs = combos(5);
    let task = spawn_run(&controller, &cs);

    // let index 0 finish and wait until index 1 is in flight on the gate
    driver.release(1);
    {
        let driver = driver.clone();
        wait_for(move || driver.seen() == vec![0] && driver.entered() == vec![0, 1]).await;
    }

    assert!(handle.pause());
    // the in-flight step completes despite the pause
    driver.release(1);
    {
        let driver = driver.clone();
        wait_for(move || driver.seen() == vec![0, 1]).await;
    }

    // permits are available, but the paused loop must not start index 2
    driver.release(3);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(driver.entered(), vec![0, 1]);
    assert_eq!(handle.state(), RunState::Paused);

    assert!(handle.resume());
    let (result, table) = task.await.expect("task panicked");
    let report = result.expect("run failed");

    assert!(report.completed);
    assert_eq!(report.executed, 5);
    // every index exactly once, in order: nothing skipped, nothing re-run
    assert_eq!(driver.seen(), vec![0, 1, 2, 3, 4]);
    assert_eq!(table.len(), 5);
}

#[tokio::test]
async fn test_stop_truncates_but_keeps_rows() {
    let driver = GatedPanel::new();
    let controller = Arc::new(BatchController::new(driver.clone()));
    let handle = controller.handle();
    handle.set_window(BatchWindow::new(0, 5));

    let cs = combos(5);
    let task = spawn_run(&controller, &cs);

    driver.release(2);
    {
        let driver = driver.clone();
        wait_for(move || driver.seen() == vec![0, 1] && driver.entered() == vec![0, 1, 2]).await;
    }

    // index 2 is in flight; stop, then let it finish
    assert!(handle.stop());
    driver.release(1);

    let (result, table) = task.await.expect("task panicked");
    let report = result.expect("run failed");

    assert!(!report.completed);
    assert_eq!(report.executed, 3);
    assert_eq!(table.len(), 3);
    assert_eq!(driver.seen(), vec![0, 1, 2]);
    assert_eq!(handle.state(), RunState::Idle);
}

#[tokio::test]
async fn test_stop_while_paused_ends_the_run() {
    let driver = GatedPanel::new();
    let controller = Arc::new(BatchController::new(driver.clone()));
    let handle = controller.handle();
    handle.set_window(BatchWindow::new(0, 4));

    let cs = combos(4);
    let task = spawn_run(&controller, &cs);

    driver.release(1);
    {
        let driver = driver.clone();
        wait_for(move || driver.seen() == vec![0] && driver.entered() == vec![0, 1]).await;
    }
    assert!(handle.pause());
    driver.release(1);
    {
        let driver = driver.clone();
        wait_for(move || driver.seen() == vec![0, 1]).await;
    }

    assert!(handle.stop());
    let (result, table) = task.await.expect("task panicked");
    let report = result.expect("run failed");

    assert!(!report.completed);
    assert_eq!(report.executed, 2);
    assert_eq!(table.len(), 2);
}

#[tokio::test]
async fn test_failed_step_is_skipped_and_recorded() {
    let controller = BatchController::new(Arc::new(FailingPanel {
        fail_on: vec![1, 3],
    }));
    controller.handle().set_window(BatchWindow::new(0, 5));

    let cs = combos(5);
    let mut table = ResultTable::new();
    let report = controller.run(&cs, &mut table).await.expect("run failed");

    assert!(report.completed);
    assert_eq!(report.executed, 3);
    assert_eq!(report.failed_count(), 2);
    let failed: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![1, 3]);

    let indices: Vec<usize> = table.rows().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 2, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_step_deadline_converts_a_hang_into_a_failure() {
    let controller = BatchController::new(Arc::new(StalledPanel))
        .with_step_timeout(Duration::from_millis(50));
    controller.handle().set_window(BatchWindow::new(0, 2));

    let cs = combos(2);
    let mut table = ResultTable::new();
    let report = controller.run(&cs, &mut table).await.expect("run failed");

    assert!(report.completed);
    assert_eq!(report.executed, 0);
    assert_eq!(report.failed_count(), 2);
    assert!(report.failures[0].error.contains("deadline"));
    assert!(table.is_empty());
}

#[tokio::test]
async fn test_control_transitions_are_guarded_when_idle() {
    let controller = BatchController::new(Arc::new(SimulatedPanel::new()));
    let handle = controller.handle();

    assert!(!handle.pause());
    assert!(!handle.resume());
    assert!(!handle.stop());
    assert_eq!(handle.state(), RunState::Idle);
}

#[tokio::test]
async fn test_window_reconfiguration_applies_to_the_next_run() {
    let controller = BatchController::new(Arc::new(SimulatedPanel::new()));
    let handle = controller.handle();

    handle.set_window(BatchWindow::new(0, 2));
    let cs = combos(6);
    let mut table = ResultTable::new();
    let first = controller.run(&cs, &mut table).await.expect("run failed");
    assert_eq!(first.executed, 2);

    handle.set_window(BatchWindow::new(2, 2));
    let second = controller.run(&cs, &mut table).await.expect("run failed");
    assert_eq!(second.executed, 2);

    let indices: Vec<usize> = table.rows().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}
