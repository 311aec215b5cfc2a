//! Error types for gridsweep-batch.

use thiserror::Error;

use gridsweep_core::CoreError;

/// Failures surfaced by a panel driver.
///
/// The injected apply/measure capability is the engine's only genuine
/// failure surface; everything upstream of it is total.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The target element could not be located
    #[error("target element not found: {selector}")]
    ElementNotFound { selector: String },

    /// The target rejected the value being applied
    #[error("could not apply value to {selector}: {reason}")]
    ApplyRejected { selector: String, reason: String },

    /// The measurement never settled
    #[error("measurement did not settle: {0}")]
    MeasurementStalled(String),

    /// Transport or environment failure
    #[error("driver i/o: {0}")]
    Io(String),
}

/// Errors from the batch control surface.
#[derive(Error, Debug)]
pub enum BatchError {
    /// A run was requested while another run is active
    #[error("a batch is already running")]
    AlreadyRunning,

    /// Plan digest computation failed
    #[error(transparent)]
    Core(#[from] CoreError),
}
