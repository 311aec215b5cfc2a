//! Error types for gridsweep-core.

use thiserror::Error;

/// Errors from the core's fallible edges.
///
/// Domain inference and grid expansion are total functions and never
/// appear here; only serialization and export sinks can fail.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonical JSON encoding failed
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing exported data failed
    #[error("export write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Two parameters share a label or selector
    #[error("duplicate parameter {kind}: {value}")]
    Duplicate { kind: &'static str, value: String },
}
