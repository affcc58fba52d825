//! Safe SQL identifier handling.
//!
//! [`Field`] represents a validated identifier (column, table, or
//! schema-qualified table), supporting dotted notation. Parts are validated
//! against `[A-Za-z_][A-Za-z0-9_$]*`, and rendering wraps every part in
//! square brackets, so identifiers can never smuggle SQL text into a
//! statement.
//!
//! # Example
//! ```ignore
//! use tsqlorm::Field;
//!
//! let t = Field::parse("dbo.Customer")?;
//! assert_eq!(t.as_sql(), "[dbo].[Customer]");
//! # Ok::<(), tsqlorm::BuildError>(())
//! ```

use std::fmt;

use crate::error::{BuildError, BuildResult};

/// A SQL identifier (column, table, or schema-qualified name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    parts: Vec<String>,
}

impl Field {
    /// Parse an identifier string, supporting dotted form (`schema.table`).
    pub fn parse(s: &str) -> BuildResult<Self> {
        if s.is_empty() {
            return Err(BuildError::invalid("Identifier cannot be empty"));
        }

        let mut parts = Vec::new();
        for part in s.split('.') {
            if part.is_empty() {
                return Err(BuildError::invalid(format!(
                    "Empty identifier segment in '{s}'"
                )));
            }
            let mut chars = part.chars();
            let first = chars.next().unwrap();
            if first != '_' && !first.is_ascii_alphabetic() {
                return Err(BuildError::invalid(format!(
                    "Invalid identifier start character '{first}' in '{s}'"
                )));
            }
            for c in chars {
                if c != '_' && c != '$' && !c.is_ascii_alphanumeric() {
                    return Err(BuildError::invalid(format!(
                        "Invalid character '{c}' in identifier '{s}'"
                    )));
                }
            }
            parts.push(part.to_string());
        }

        Ok(Self { parts })
    }

    /// The unbracketed name, with dots between parts.
    pub fn name(&self) -> String {
        self.parts.join(".")
    }

    /// The last part of the identifier (the column name for a dotted field).
    ///
    /// Parameter names are derived from this.
    pub fn short_name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Render the identifier with every part bracketed.
    pub fn as_sql(&self) -> String {
        let mut cap = self.parts.len().saturating_sub(1);
        for part in &self.parts {
            cap += part.len() + 2;
        }
        let mut out = String::with_capacity(cap);
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('[');
            out.push_str(part);
            out.push(']');
        }
        out
    }

    /// Name identity under the dialect's default collation.
    pub fn matches(&self, other: &Field) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Case-insensitive match against a bare name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_sql())
    }
}

/// Sort direction for an [`OrderField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// The fixed SQL token for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// A field paired with a sort direction, for ORDER BY clauses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderField {
    field: Field,
    direction: Direction,
}

impl OrderField {
    /// Create an order field.
    pub fn new(name: &str, direction: Direction) -> BuildResult<Self> {
        Ok(Self {
            field: Field::parse(name)?,
            direction,
        })
    }

    /// Create an ascending order field.
    pub fn ascending(name: &str) -> BuildResult<Self> {
        Self::new(name, Direction::Ascending)
    }

    /// Create a descending order field.
    pub fn descending(name: &str) -> BuildResult<Self> {
        Self::new(name, Direction::Descending)
    }

    /// The underlying field.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Render as `[Name] ASC` / `[Name] DESC`.
    pub fn as_sql(&self) -> String {
        format!("{} {}", self.field.as_sql(), self.direction.as_sql())
    }
}
