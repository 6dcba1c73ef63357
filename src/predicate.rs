//! Predicate engine
//!
//! Filters are conjunctions of field equalities. A constraint on a field
//! the record does not carry never matches, even when the constraint value
//! is `null`.

use crate::record::{Fields, Record};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A reusable test over records.
pub type BoxPredicate = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// Build a constraint map from `(field, value)` pairs.
pub fn constraints<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Conjunctive equality test. An empty map matches everything.
pub fn from_constraints(constraints: Fields) -> impl Fn(&Record) -> bool + Send + Sync {
    move |record| {
        constraints
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

pub fn has_key_value(field: impl Into<String>, value: impl Into<Value>) -> BoxPredicate {
    let field = field.into();
    let value = value.into();
    Box::new(move |record| record.get(&field) == Some(&value))
}

/// Field value is one of `values`.
pub fn has_key_in(field: impl Into<String>, values: Vec<Value>) -> BoxPredicate {
    let field = field.into();
    Box::new(move |record| record.get(&field).is_some_and(|v| values.contains(v)))
}

/// Created strictly after `instant`. Records without a parseable
/// `created_at` never match.
pub fn created_after(instant: DateTime<Utc>) -> BoxPredicate {
    Box::new(move |record| record.created_at().is_some_and(|ts| ts > instant))
}

pub fn all_of(predicates: Vec<BoxPredicate>) -> BoxPredicate {
    Box::new(move |record| predicates.iter().all(|p| p(record)))
}
