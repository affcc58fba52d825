//! Predicate expressions.
//!
//! A [`Predicate`] is the structured form of a filter expression before it is
//! lowered into the [`QueryGroup`](crate::QueryGroup) representation. It is
//! built with constructor and combinator methods:
//!
//! ```ignore
//! use tsqlorm::{Predicate, QueryGroup};
//!
//! let p = Predicate::gt("Age", 18).and(Predicate::eq("Name", "Bob"));
//! let group = QueryGroup::parse(&p)?;
//! # Ok::<(), tsqlorm::BuildError>(())
//! ```
//!
//! String methods ([`contains`](Predicate::contains),
//! [`starts_with`](Predicate::starts_with), [`ends_with`](Predicate::ends_with))
//! lower to LIKE patterns; [`in_list`](Predicate::in_list) lowers to IN;
//! [`any`](Predicate::any)/[`all`](Predicate::all) fan a comparison out over a
//! collection as an OR/AND group. Negation is applied with
//! [`not`](Predicate::not) and propagates through leaves and groups during
//! lowering.

use crate::value::Value;

/// The comparison kinds a [`Predicate::Compare`] node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    /// The logical complement, for negation propagation.
    pub(crate) fn negated(self) -> Self {
        match self {
            Comparison::Equal => Comparison::NotEqual,
            Comparison::NotEqual => Comparison::Equal,
            Comparison::LessThan => Comparison::GreaterThanOrEqual,
            Comparison::LessThanOrEqual => Comparison::GreaterThan,
            Comparison::GreaterThan => Comparison::LessThanOrEqual,
            Comparison::GreaterThanOrEqual => Comparison::LessThan,
        }
    }
}

/// A filter expression over entity fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A constant boolean; absorbed or rejected during lowering.
    Literal(bool),
    /// field <cmp> value
    Compare {
        field: String,
        comparison: Comparison,
        value: Value,
    },
    /// field LIKE %fragment%
    Contains { field: String, fragment: String },
    /// field LIKE prefix%
    StartsWith { field: String, prefix: String },
    /// field LIKE %suffix
    EndsWith { field: String, suffix: String },
    /// field IN (values...)
    In { field: String, values: Vec<Value> },
    /// field BETWEEN lower AND upper
    Between {
        field: String,
        lower: Value,
        upper: Value,
    },
    /// The comparison holds for at least one element (OR fan-out).
    Any {
        field: String,
        comparison: Comparison,
        values: Vec<Value>,
    },
    /// The comparison holds for every element (AND fan-out).
    All {
        field: String,
        comparison: Comparison,
        values: Vec<Value>,
    },
    /// Every operand holds.
    And(Vec<Predicate>),
    /// At least one operand holds.
    Or(Vec<Predicate>),
    /// The operand does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// A constant boolean predicate.
    pub fn literal(value: bool) -> Self {
        Predicate::Literal(value)
    }

    /// field = value
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Equal, value)
    }

    /// field <> value
    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::NotEqual, value)
    }

    /// field > value
    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::GreaterThan, value)
    }

    /// field >= value
    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::GreaterThanOrEqual, value)
    }

    /// field < value
    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::LessThan, value)
    }

    /// field <= value
    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::LessThanOrEqual, value)
    }

    /// An arbitrary comparison node.
    pub fn compare(field: &str, comparison: Comparison, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.to_string(),
            comparison,
            value: value.into(),
        }
    }

    /// field LIKE %fragment%
    pub fn contains(field: &str, fragment: &str) -> Self {
        Predicate::Contains {
            field: field.to_string(),
            fragment: fragment.to_string(),
        }
    }

    /// field LIKE prefix%
    pub fn starts_with(field: &str, prefix: &str) -> Self {
        Predicate::StartsWith {
            field: field.to_string(),
            prefix: prefix.to_string(),
        }
    }

    /// field LIKE %suffix
    pub fn ends_with(field: &str, suffix: &str) -> Self {
        Predicate::EndsWith {
            field: field.to_string(),
            suffix: suffix.to_string(),
        }
    }

    /// field IN (values...)
    pub fn in_list<T: Into<Value>>(field: &str, values: Vec<T>) -> Self {
        Predicate::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// field BETWEEN lower AND upper
    pub fn between(field: &str, lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Predicate::Between {
            field: field.to_string(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// The comparison holds for at least one element.
    pub fn any<T: Into<Value>>(field: &str, comparison: Comparison, values: Vec<T>) -> Self {
        Predicate::Any {
            field: field.to_string(),
            comparison,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The comparison holds for every element.
    pub fn all<T: Into<Value>>(field: &str, comparison: Comparison, values: Vec<T>) -> Self {
        Predicate::All {
            field: field.to_string(),
            comparison,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjoin with another predicate, flattening nested ANDs.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut operands) => {
                operands.push(other);
                Predicate::And(operands)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Disjoin with another predicate, flattening nested ORs.
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut operands) => {
                operands.push(other);
                Predicate::Or(operands)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    /// Negate this predicate.
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens() {
        let p = Predicate::eq("A", 1)
            .and(Predicate::eq("B", 2))
            .and(Predicate::eq("C", 3));
        match p {
            Predicate::And(operands) => assert_eq!(operands.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn or_flattens() {
        let p = Predicate::eq("A", 1)
            .or(Predicate::eq("B", 2))
            .or(Predicate::eq("C", 3));
        match p {
            Predicate::Or(operands) => assert_eq!(operands.len(), 3),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn comparison_negation_is_involutive() {
        let all = [
            Comparison::Equal,
            Comparison::NotEqual,
            Comparison::LessThan,
            Comparison::LessThanOrEqual,
            Comparison::GreaterThan,
            Comparison::GreaterThanOrEqual,
        ];
        for cmp in all {
            assert_eq!(cmp.negated().negated(), cmp);
        }
    }
}
