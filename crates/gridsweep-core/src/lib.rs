//! GridSweep Core
//!
//! Pure domain logic for automated parameter sweeps against an external,
//! UI-only target:
//! - infer a parameter's typed domain from one observed value
//! - expand a parameter set into its full Cartesian grid
//! - accumulate heterogeneous result rows into a schema-normalized table
//! - project the table to CSV
//!
//! Nothing here is async and nothing touches the outside world beyond an
//! export sink; the batch state machine lives in `gridsweep-batch`.

pub mod digest;
pub mod error;
pub mod export;
pub mod grid;
pub mod infer;
pub mod param;
pub mod table;

pub use digest::PlanDigest;
pub use error::CoreError;
pub use export::{to_csv, write_csv};
pub use grid::{combination_count, expand, value_list, Combination};
pub use infer::{infer_domain, CapturedInput, Observation};
pub use param::{DomainSpec, ParamDomain, ParamSet};
pub use table::{ResultRow, ResultTable};

/// GridSweep version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
