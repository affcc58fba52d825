//! Comparison and conjunction vocabularies.
//!
//! Both enums are closed sets: every tag carries its fixed SQL token via
//! [`Operation::as_sql`] / [`Conjunction::as_sql`], and both derive serde
//! `snake_case` tags so the dynamic descriptor parser can recognize them
//! without any reflection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BuildError;

/// Comparison/set operator for a single query field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// column = value
    Equal,
    /// column <> value
    NotEqual,
    /// column < value
    LessThan,
    /// column <= value
    LessThanOrEqual,
    /// column > value
    GreaterThan,
    /// column >= value
    GreaterThanOrEqual,
    /// column LIKE pattern
    Like,
    /// column NOT LIKE pattern
    NotLike,
    /// column BETWEEN a AND b
    Between,
    /// column NOT BETWEEN a AND b
    NotBetween,
    /// column IN (list)
    In,
    /// column NOT IN (list)
    NotIn,
}

impl Operation {
    /// The fixed SQL token for this operation.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operation::Equal => "=",
            Operation::NotEqual => "<>",
            Operation::LessThan => "<",
            Operation::LessThanOrEqual => "<=",
            Operation::GreaterThan => ">",
            Operation::GreaterThanOrEqual => ">=",
            Operation::Like => "LIKE",
            Operation::NotLike => "NOT LIKE",
            Operation::Between => "BETWEEN",
            Operation::NotBetween => "NOT BETWEEN",
            Operation::In => "IN",
            Operation::NotIn => "NOT IN",
        }
    }

    /// The logical complement, used when a negation propagates onto a leaf.
    pub fn negated(self) -> Self {
        match self {
            Operation::Equal => Operation::NotEqual,
            Operation::NotEqual => Operation::Equal,
            Operation::LessThan => Operation::GreaterThanOrEqual,
            Operation::LessThanOrEqual => Operation::GreaterThan,
            Operation::GreaterThan => Operation::LessThanOrEqual,
            Operation::GreaterThanOrEqual => Operation::LessThan,
            Operation::Like => Operation::NotLike,
            Operation::NotLike => Operation::Like,
            Operation::Between => Operation::NotBetween,
            Operation::NotBetween => Operation::Between,
            Operation::In => Operation::NotIn,
            Operation::NotIn => Operation::In,
        }
    }

    /// Whether the operand must be a two-element range array.
    pub(crate) fn is_range(&self) -> bool {
        matches!(self, Operation::Between | Operation::NotBetween)
    }

    /// Whether the operand must be a non-empty list array.
    pub(crate) fn is_set(&self) -> bool {
        matches!(self, Operation::In | Operation::NotIn)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operation {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| BuildError::invalid(format!("Unknown operation '{s}'")))
    }
}

/// Boolean connective joining the members of a query group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conjunction {
    /// All members must hold
    And,
    /// At least one member must hold
    Or,
}

impl Conjunction {
    /// The fixed SQL token for this conjunction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }

    /// De Morgan dual: the connective a negation distributes into.
    pub(crate) fn flipped(self) -> Self {
        match self {
            Conjunction::And => Conjunction::Or,
            Conjunction::Or => Conjunction::And,
        }
    }
}

impl Default for Conjunction {
    fn default() -> Self {
        Conjunction::And
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
