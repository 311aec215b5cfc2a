//! Parameter domain descriptors and the parameter-set collection.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Typed domain of one sweepable parameter.
///
/// Serialized with a `type` tag so parameter files read
/// `{"type": "integer", "baseline": 14, "min": 7, "max": 21, "step": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DomainSpec {
    /// Two-state toggle. No bounds, no step.
    Checkbox { baseline: bool },

    /// Whole-number range, inclusive on both ends.
    Integer {
        baseline: i64,
        min: i64,
        max: i64,
        step: i64,
    },

    /// Real-valued range, inclusive on both ends.
    Float {
        baseline: f64,
        min: f64,
        max: f64,
        step: f64,
    },
}

impl DomainSpec {
    /// Kind name, matching the serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainSpec::Checkbox { .. } => "checkbox",
            DomainSpec::Integer { .. } => "integer",
            DomainSpec::Float { .. } => "float",
        }
    }
}

/// One sweepable dimension: a labelled, locatable external input plus
/// its typed domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDomain {
    /// Field key used in combinations and result rows. Unique within a set.
    pub label: String,

    /// Opaque locator for the external target element. Never interpreted
    /// by the engine; only the driver that applies values reads it.
    pub selector: String,

    #[serde(flatten)]
    pub spec: DomainSpec,
}

/// Ordered collection of the parameters targeted by one sweep.
///
/// Insertion order is expansion order: the first parameter varies slowest
/// in the generated grid. Serializes transparently as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    params: Vec<ParamDomain>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Returns `false` when the selector or label is
    /// already present, so repeated captures of the same input stay
    /// idempotent and combination keys stay unique.
    pub fn insert(&mut self, param: ParamDomain) -> bool {
        let taken = self
            .params
            .iter()
            .any(|p| p.selector == param.selector || p.label == param.label);
        if taken {
            return false;
        }
        self.params.push(param);
        true
    }

    /// Remove a parameter by label, returning it if present.
    pub fn remove(&mut self, label: &str) -> Option<ParamDomain> {
        let idx = self.params.iter().position(|p| p.label == label)?;
        Some(self.params.remove(idx))
    }

    /// Drop all parameters.
    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Mutable access for direct field edits (ranges, steps, relabeling).
    pub fn get_mut(&mut self, label: &str) -> Option<&mut ParamDomain> {
        self.params.iter_mut().find(|p| p.label == label)
    }

    pub fn params(&self) -> &[ParamDomain] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Check the uniqueness invariants. Sets built through [`insert`]
    /// always hold them; sets deserialized from a file may not.
    ///
    /// [`insert`]: ParamSet::insert
    pub fn validate(&self) -> Result<(), CoreError> {
        for (i, param) in self.params.iter().enumerate() {
            for other in &self.params[i + 1..] {
                if other.label == param.label {
                    return Err(CoreError::Duplicate {
                        kind: "label",
                        value: param.label.clone(),
                    });
                }
                if other.selector == param.selector {
                    return Err(CoreError::Duplicate {
                        kind: "selector",
                        value: param.selector.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
