//! GridSweep Batch
//!
//! The batch-execution state machine: walks a window of a combination
//! sequence, one injected apply/measure call at a time, with a
//! run/pause/resume/stop control surface, and feeds every measured row
//! into the schema-tolerant table from `gridsweep-core`.

pub mod controller;
pub mod driver;
pub mod error;
pub mod fakes;
pub mod telemetry;

// Re-export key types
pub use controller::{BatchController, BatchHandle, BatchReport, BatchWindow, RunState, StepFailure};
pub use driver::{DriverResult, PanelDriver};
pub use error::{BatchError, DriverError};
pub use fakes::SimulatedPanel;
pub use telemetry::init_tracing;
