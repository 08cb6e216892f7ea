//! Conjunctive filter predicates and field projections over documents

use serde_json::Value;
use std::cmp::Ordering;

use super::document::{FieldLookup, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A filter over document fields.
///
/// Comparisons follow document-store rules: an absent field never satisfies
/// `Eq` or an ordering comparison, but does satisfy `Ne`. Numbers compare by
/// value (`10` equals `10.0`); ordering comparisons only apply between two
/// numbers or two strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare { field: String, op: CompareOp, value: Value },
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s
    pub fn and(self, other: Predicate) -> Self {
        let mut parts = match self {
            Predicate::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Predicate::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Predicate::And(parts)
    }

    pub fn matches<D: FieldLookup + ?Sized>(&self, doc: &D) -> bool {
        match self {
            Predicate::And(parts) => parts.iter().all(|p| p.matches(doc)),
            Predicate::Compare { field, op, value } => {
                let Some(actual) = doc.lookup(field) else {
                    return *op == CompareOp::Ne;
                };
                let ord = order_values(&actual, value);
                match op {
                    CompareOp::Eq => values_equal(&actual, value),
                    CompareOp::Ne => !values_equal(&actual, value),
                    CompareOp::Lt => ord == Some(Ordering::Less),
                    CompareOp::Lte => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                    CompareOp::Gt => ord == Some(Ordering::Greater),
                    CompareOp::Gte => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
                }
            }
        }
    }
}

/// Equality with numbers compared by value
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Ordering between two numbers or two strings; `None` for anything else
pub fn order_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// The fields to keep from each matching document, in output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Keep only the projected fields; absent fields are left out
    pub fn apply<D: FieldLookup + ?Sized>(&self, doc: &D) -> Row {
        let mut row = Row::new();
        for field in &self.fields {
            if let Some(value) = doc.lookup(field) {
                row.insert(field.clone(), value);
            }
        }
        row
    }
}
