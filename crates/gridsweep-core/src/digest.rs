//! Stable identity for a combination-set snapshot.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// SHA-256 hex digest of a plan's canonical JSON form.
///
/// Computed over whatever value defines the sweep, usually the expanded
/// combination sequence. Identical plans share a digest, so every batch
/// report can be traced back to the exact grid it ran over even after
/// the parameter set has been edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanDigest(String);

impl PlanDigest {
    /// Compute the digest of a serializable plan value.
    pub fn of<T: Serialize>(plan: &T) -> Result<Self, CoreError> {
        let bytes = serde_json::to_vec(plan)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(PlanDigest(hex::encode(hasher.finalize())))
    }

    /// Full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for PlanDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
