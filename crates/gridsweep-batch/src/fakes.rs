//! In-memory stand-ins for a live settings panel (testing and demos).
//!
//! Real deployments implement [`PanelDriver`] against the actual target
//! (DOM manipulation, RPC, whatever the panel speaks). The fake here
//! satisfies the same contract without any external dependency.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use gridsweep_core::{CapturedInput, Combination, Observation, ResultRow};

use crate::driver::{DriverResult, PanelDriver};

/// Deterministic fake panel.
///
/// Derives a scalar from the combination (booleans count as 0/1) and
/// feeds fixed formulas for the usual strategy-tester metrics, so
/// identical combinations always measure identically. Latency simulates
/// the settle time of a real measurement.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPanel {
    latency: Duration,
}

impl SimulatedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated measurement settle time per step.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    /// Inputs this panel would expose to a capture pass.
    pub fn capturable_inputs() -> Vec<CapturedInput> {
        vec![
            CapturedInput {
                selector: "#length".to_string(),
                label: "Length".to_string(),
                observed: Observation::Text("14".to_string()),
            },
            CapturedInput {
                selector: "#factor".to_string(),
                label: "Factor".to_string(),
                observed: Observation::Text("1.5".to_string()),
            },
            CapturedInput {
                selector: "#reinvest".to_string(),
                label: "Reinvest".to_string(),
                observed: Observation::Toggle(true),
            },
        ]
    }

    fn scalar(combo: &Combination) -> f64 {
        combo
            .values()
            .map(|v| match v {
                Value::Bool(true) => 1.0,
                Value::Bool(false) => 0.0,
                Value::Number(n) => n.as_f64().unwrap_or(0.0),
                _ => 0.0,
            })
            .sum()
    }
}

#[async_trait]
impl PanelDriver for SimulatedPanel {
    async fn apply_and_measure(
        &self,
        combo: &Combination,
        index: usize,
    ) -> DriverResult<ResultRow> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let h = Self::scalar(combo);
        let row = ResultRow::new(index, combo)
            .with_metric("net_profit", round2(h * 3.14))
            .with_metric("max_drawdown", round2((50.0 - h).abs() * 1.1))
            .with_metric("profit_factor", round2(1.0 + h.rem_euclid(10.0) / 5.0))
            .with_metric("win_rate", round2(40.0 + h.rem_euclid(30.0)))
            .with_metric("trades", 10 + (h.round() as i64).rem_euclid(50));
        Ok(row)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
