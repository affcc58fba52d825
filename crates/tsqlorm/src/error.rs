//! Error types for tsqlorm

use thiserror::Error;

/// Result type alias for statement composition operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Error types raised while composing statements.
///
/// All variants are raised synchronously at parse/compose time and indicate a
/// programming or mapping defect, never a transient database condition.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An operand violates its shape invariant, or a descriptor is malformed
    #[error("Invalid query expression: {0}")]
    InvalidExpression(String),

    /// A predicate shape the compiler does not recognize
    #[error("Unsupported expression: {0}")]
    Unsupported(String),

    /// A field is not mapped for the requested command, or an allow-list
    /// intersection left nothing usable
    #[error("Mapping violation: {0}")]
    Mapping(String),

    /// A required input was null/absent
    #[error("Argument '{0}' must not be null")]
    NullArgument(&'static str),
}

impl BuildError {
    /// Create an invalid-expression error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidExpression(message.into())
    }

    /// Create an unsupported-expression error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create a mapping-violation error
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }

    /// Check if this is an invalid-expression error
    pub fn is_invalid_expression(&self) -> bool {
        matches!(self, Self::InvalidExpression(_))
    }

    /// Check if this is a mapping violation
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }
}
