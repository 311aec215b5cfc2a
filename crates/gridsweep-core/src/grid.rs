//! Cartesian expansion of a parameter set into value combinations.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::param::{DomainSpec, ParamDomain};

/// One point in the sweep space: parameter label to concrete value.
pub type Combination = BTreeMap<String, Value>;

/// Upper-bound tolerance absorbing float drift across many step additions.
const STEP_EPSILON: f64 = 1e-12;

/// Expand one domain into its ordered candidate values.
///
/// Checkboxes always yield `[true, false]`. Numeric domains yield the
/// inclusive arithmetic sequence from `min` to `max`; degenerate bounds
/// (`step <= 0` or `min > max`) yield an empty list, which empties the
/// whole product downstream. Float values are rounded to 8 decimals so
/// step noise does not accumulate across long sequences.
pub fn value_list(spec: &DomainSpec) -> Vec<Value> {
    match spec {
        DomainSpec::Checkbox { .. } => vec![Value::Bool(true), Value::Bool(false)],
        DomainSpec::Integer { min, max, step, .. } => {
            if *step <= 0 || min > max {
                return Vec::new();
            }
            let mut values = Vec::new();
            let mut v = *min;
            while v <= *max {
                values.push(json!(v));
                v = match v.checked_add(*step) {
                    Some(next) => next,
                    None => break,
                };
            }
            values
        }
        DomainSpec::Float { min, max, step, .. } => {
            if *step <= 0.0 || min > max {
                return Vec::new();
            }
            let mut values = Vec::new();
            let mut v = *min;
            while v <= *max + STEP_EPSILON {
                values.push(json!(round8(v)));
                v += step;
            }
            values
        }
    }
}

/// Expand the parameter set into its full Cartesian product.
///
/// Odometer order: the first parameter varies slowest, the last varies
/// fastest. The ordering is part of the contract; batch windows select
/// index ranges out of this sequence and must land on the same
/// combinations every time the same set is expanded.
pub fn expand(params: &[ParamDomain]) -> Vec<Combination> {
    if params.is_empty() {
        return Vec::new();
    }
    let lists: Vec<(&str, Vec<Value>)> = params
        .iter()
        .map(|p| (p.label.as_str(), value_list(&p.spec)))
        .collect();
    if lists.iter().any(|(_, values)| values.is_empty()) {
        return Vec::new();
    }
    let mut combos = Vec::new();
    expand_into(&lists, 0, BTreeMap::new(), &mut combos);
    combos
}

fn expand_into(
    lists: &[(&str, Vec<Value>)],
    idx: usize,
    current: Combination,
    out: &mut Vec<Combination>,
) {
    if idx == lists.len() {
        out.push(current);
        return;
    }
    let (label, values) = &lists[idx];
    for value in values {
        let mut next = current.clone();
        next.insert((*label).to_string(), value.clone());
        expand_into(lists, idx + 1, next, out);
    }
}

/// Number of combinations the set expands to, without materializing them.
///
/// Saturates at `usize::MAX`; callers are responsible for keeping the
/// product tractable through batch windowing.
pub fn combination_count(params: &[ParamDomain]) -> usize {
    if params.is_empty() {
        return 0;
    }
    params
        .iter()
        .map(|p| value_list(&p.spec).len())
        .fold(1usize, |acc, n| acc.saturating_mul(n))
}

fn round8(v: f64) -> f64 {
    (v * 100_000_000.0).round() / 100_000_000.0
}
