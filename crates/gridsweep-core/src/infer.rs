//! Domain inference from a single observed value.
//!
//! A heuristic, not an optimizer: every observation maps to some valid
//! domain descriptor, and the same observation always maps to the same
//! descriptor. Nothing here can fail.

use serde::{Deserialize, Serialize};

use crate::param::{DomainSpec, ParamDomain};

/// A raw value read from an external input element.
///
/// Untagged, so capture files hold plain JSON scalars: `true`, `3.5`,
/// `"1,250 %"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    /// Checkbox state.
    Toggle(bool),
    /// Reading that arrived already numeric.
    Number(f64),
    /// Free text, possibly a formatted number.
    Text(String),
}

/// Boundary record produced by a capture source: where the input lives,
/// what to call it, and what it currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedInput {
    pub selector: String,
    pub label: String,
    pub observed: Observation,
}

impl CapturedInput {
    /// Infer a full parameter domain from this capture.
    pub fn into_domain(self) -> ParamDomain {
        let spec = infer_domain(&self.observed);
        ParamDomain {
            label: self.label,
            selector: self.selector,
            spec,
        }
    }
}

/// Derive a typed domain from one observed value.
///
/// Numeric readings get an asymmetric range around the observation and a
/// step sized from the printed precision. Anything that does not parse
/// as a finite number falls back to a unit float range.
pub fn infer_domain(observed: &Observation) -> DomainSpec {
    match observed {
        Observation::Toggle(state) => DomainSpec::Checkbox { baseline: *state },
        Observation::Number(value) => {
            if !value.is_finite() {
                return text_fallback();
            }
            numeric_domain(*value, decimal_places(&value.to_string()))
        }
        Observation::Text(text) => {
            let normalized: String = text
                .chars()
                .filter(|c| !matches!(c, ',' | '%' | '$') && !c.is_whitespace())
                .collect();
            if normalized.is_empty() {
                return text_fallback();
            }
            match normalized.parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    numeric_domain(value, decimal_places(&normalized))
                }
                _ => text_fallback(),
            }
        }
    }
}

/// Safe default for unknown or text-like inputs.
fn text_fallback() -> DomainSpec {
    DomainSpec::Float {
        baseline: 0.0,
        min: 0.0,
        max: 1.0,
        step: 0.1,
    }
}

/// Digits after the decimal point in the normalized text, capped at 2.
fn decimal_places(normalized: &str) -> usize {
    normalized
        .split('.')
        .nth(1)
        .map(|frac| frac.len())
        .unwrap_or(0)
        .min(2)
}

fn numeric_domain(value: f64, places: usize) -> DomainSpec {
    let step = round4(10f64.powi(-(places as i32)));
    let (min, max) = if value > 0.0 {
        ((value * 0.5).max(0.0), value * 1.5)
    } else {
        // the -1/+1 offsets keep the range non-degenerate at zero
        (
            value - value.abs() * 0.5 - 1.0,
            value + value.abs() * 0.5 + 1.0,
        )
    };
    if value.fract() == 0.0 {
        DomainSpec::Integer {
            baseline: value.round() as i64,
            min: min.round() as i64,
            max: max.round() as i64,
            step: 1,
        }
    } else {
        DomainSpec::Float {
            baseline: value,
            min: round4(min),
            max: round4(max),
            step,
        }
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
