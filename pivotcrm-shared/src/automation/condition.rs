/// Condition predicates for automation rules
///
/// A rule's condition is a tree of typed predicates evaluated against the
/// event context (a flat map of field name to JSON value). Evaluation is total
/// and pure: a missing field or a type mismatch makes the leaf false, never an
/// error, and the same context always produces the same result.
///
/// # Persistence shape
///
/// Predicates serialize with an `op` tag, e.g.:
///
/// ```json
/// {
///   "op": "all",
///   "preds": [
///     { "op": "gt", "field": "budget", "value": 1000 },
///     { "op": "eq", "field": "source", "value": "referral" }
///   ]
/// }
/// ```
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Event context: field name to value for the triggering entity and actor
pub type EventContext = Map<String, JsonValue>;

/// A condition predicate over an event context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Field equals value (JSON equality, numbers compared numerically)
    Eq {
        /// Context field name
        field: String,
        /// Expected value
        value: JsonValue,
    },

    /// Field does not equal value; false when the field is missing
    Ne {
        /// Context field name
        field: String,
        /// Excluded value
        value: JsonValue,
    },

    /// Numeric: field > value
    Gt {
        /// Context field name
        field: String,
        /// Threshold
        value: f64,
    },

    /// Numeric: field >= value
    Gte {
        /// Context field name
        field: String,
        /// Threshold
        value: f64,
    },

    /// Numeric: field < value
    Lt {
        /// Context field name
        field: String,
        /// Threshold
        value: f64,
    },

    /// Numeric: field <= value
    Lte {
        /// Context field name
        field: String,
        /// Threshold
        value: f64,
    },

    /// String containment: field contains the given substring
    Contains {
        /// Context field name
        field: String,
        /// Substring to look for
        value: String,
    },

    /// Conjunction; vacuously true when empty
    All {
        /// Sub-predicates, all of which must hold
        preds: Vec<Predicate>,
    },

    /// Disjunction; vacuously false when empty
    Any {
        /// Sub-predicates, at least one of which must hold
        preds: Vec<Predicate>,
    },

    /// Negation of the inner predicate
    ///
    /// Note that a missing field makes the inner predicate false, so `Not`
    /// over a missing field is true. Conditions that must also guard against
    /// absence combine `Not` with an equality on the same field.
    Not {
        /// Negated predicate
        pred: Box<Predicate>,
    },
}

impl Predicate {
    /// Evaluates the predicate against an event context
    ///
    /// Total: never panics, never errors. Missing fields and type mismatches
    /// evaluate the leaf to false.
    pub fn matches(&self, ctx: &EventContext) -> bool {
        match self {
            Predicate::Eq { field, value } => ctx
                .get(field)
                .map(|actual| json_eq(actual, value))
                .unwrap_or(false),
            Predicate::Ne { field, value } => ctx
                .get(field)
                .map(|actual| !json_eq(actual, value))
                .unwrap_or(false),
            Predicate::Gt { field, value } => cmp_num(ctx, field, |n| n > *value),
            Predicate::Gte { field, value } => cmp_num(ctx, field, |n| n >= *value),
            Predicate::Lt { field, value } => cmp_num(ctx, field, |n| n < *value),
            Predicate::Lte { field, value } => cmp_num(ctx, field, |n| n <= *value),
            Predicate::Contains { field, value } => ctx
                .get(field)
                .and_then(JsonValue::as_str)
                .map(|s| s.contains(value.as_str()))
                .unwrap_or(false),
            Predicate::All { preds } => preds.iter().all(|p| p.matches(ctx)),
            Predicate::Any { preds } => preds.iter().any(|p| p.matches(ctx)),
            Predicate::Not { pred } => !pred.matches(ctx),
        }
    }

    /// Convenience constructor for an always-true condition
    pub fn always() -> Self {
        Predicate::All { preds: Vec::new() }
    }
}

/// JSON equality with numeric normalization, so 1500 == 1500.0
fn json_eq(actual: &JsonValue, expected: &JsonValue) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn cmp_num(ctx: &EventContext, field: &str, op: impl Fn(f64) -> bool) -> bool {
    ctx.get(field)
        .and_then(JsonValue::as_f64)
        .map(op)
        .unwrap_or(false)
}
