//! The injected capability that touches the external target.

use async_trait::async_trait;

use gridsweep_core::{Combination, ResultRow};

use crate::error::DriverError;

/// Result type for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A driver that can push one combination into the external settings
/// panel and read back the resulting measurement.
///
/// Contract:
/// - Invoked strictly one combination at a time, in increasing index
///   order; the external target is a single shared stateful resource
///   and cannot accept concurrent writes.
/// - The returned row must carry the combination's values so results
///   stay attributable to the point that produced them.
/// - How values are physically written (DOM manipulation, RPC,
///   simulation) is entirely the implementation's concern.
#[async_trait]
pub trait PanelDriver: Send + Sync {
    /// Apply `combo` to the target and return the measured row for `index`.
    async fn apply_and_measure(&self, combo: &Combination, index: usize)
        -> DriverResult<ResultRow>;
}
